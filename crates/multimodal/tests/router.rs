use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::json;

use spirit_core::config::MultimodalConfig;
use spirit_sentiment::Language;
use spirit_multimodal::error::Result;
use spirit_multimodal::{
    Content, InferenceBackend, Modality, MultiModalTaskRouter, ProcessingError, SafetyLevel,
    TaskExecutor, TaskOutput, TaskType,
};

fn config(workers: usize) -> MultimodalConfig {
    MultimodalConfig {
        workers,
        cache_capacity: 16,
        timeout_secs: 5,
        queue_capacity: 32,
    }
}

/// PCM WAV header for `frames` mono 16-bit samples.
fn wav(sample_rate: u32, frames: u32) -> Vec<u8> {
    let data_len = frames * 2;
    let mut v = Vec::new();
    v.extend_from_slice(b"RIFF");
    v.extend_from_slice(&(36 + data_len).to_le_bytes());
    v.extend_from_slice(b"WAVEfmt ");
    v.extend_from_slice(&16u32.to_le_bytes());
    v.extend_from_slice(&1u16.to_le_bytes());
    v.extend_from_slice(&1u16.to_le_bytes());
    v.extend_from_slice(&sample_rate.to_le_bytes());
    v.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    v.extend_from_slice(&2u16.to_le_bytes());
    v.extend_from_slice(&16u16.to_le_bytes());
    v.extend_from_slice(b"data");
    v.extend_from_slice(&data_len.to_le_bytes());
    v.resize(v.len() + data_len as usize, 0);
    v
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut v = b"\x89PNG\r\n\x1a\n".to_vec();
    v.extend_from_slice(&13u32.to_be_bytes());
    v.extend_from_slice(b"IHDR");
    v.extend_from_slice(&width.to_be_bytes());
    v.extend_from_slice(&height.to_be_bytes());
    v.extend_from_slice(&[8, 6, 0, 0, 0]);
    v
}

struct Transcriber;

#[async_trait]
impl InferenceBackend for Transcriber {
    fn name(&self) -> &str {
        "stub-stt"
    }

    fn supports(&self, modality: Modality, task: TaskType) -> bool {
        modality == Modality::Audio && task == TaskType::SpeechToText
    }

    async fn infer(&self, _content: &Content, _task: TaskType) -> Result<TaskOutput> {
        Ok(TaskOutput::new(json!({ "transcript": "the bus never arrived" }), 0.8))
    }
}

/// Sleeps, and records how many inferences overlap.
#[derive(Default)]
struct SlowCounter {
    delay: Duration,
    active: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait]
impl InferenceBackend for SlowCounter {
    fn name(&self) -> &str {
        "slow-counter"
    }

    fn supports(&self, modality: Modality, task: TaskType) -> bool {
        modality == Modality::Text && task == TaskType::Embedding
    }

    async fn infer(&self, _content: &Content, _task: TaskType) -> Result<TaskOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(TaskOutput::new(json!({ "vector": [0.0, 1.0] }), 1.0))
    }
}

fn counter(delay_ms: u64) -> Arc<SlowCounter> {
    Arc::new(SlowCounter {
        delay: Duration::from_millis(delay_ms),
        ..Default::default()
    })
}

#[tokio::test]
async fn unsupported_audio_tasks_are_rejected() {
    let router = MultiModalTaskRouter::with_defaults(&config(2));
    let err = router
        .process(
            Content::new(Modality::Audio, vec![1u8, 2, 3]),
            &[TaskType::Ocr, TaskType::ObjectDetection],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessingError::NoValidTasks { modality: Modality::Audio, .. }));

    let stats = router.stats();
    assert_eq!(stats.calls_failed, 1);
    assert_eq!(stats.tasks_dropped, 2);
}

#[tokio::test]
async fn speech_to_text_runs_on_a_registered_backend() {
    let executor = TaskExecutor::default().with_backend(Arc::new(Transcriber));
    let router = MultiModalTaskRouter::new(&config(2), executor);
    let results = router
        .process(
            Content::new(Modality::Audio, b"RIFF....WAVE".to_vec()),
            &[TaskType::SpeechToText, TaskType::Ocr],
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].task_type, TaskType::SpeechToText);
    assert_eq!(results[0].processor, "stub-stt");
    assert_eq!(results[0].result["transcript"], "the bus never arrived");
    assert_eq!(router.stats().tasks_dropped, 1);
}

#[tokio::test]
async fn speech_to_text_without_backend_degrades() {
    let router = MultiModalTaskRouter::with_defaults(&config(1));
    let results = router
        .process(Content::new(Modality::Audio, wav(16_000, 48_000)), &[TaskType::SpeechToText])
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    let r = &results[0];
    assert_eq!(r.processor, "heuristic");
    assert_eq!(r.result["degraded"], true);
    assert_eq!(r.result["reason"], "model_unavailable");
    assert_eq!(r.result["metadata"]["format"], "wav");
    assert!((r.result["duration_secs"].as_f64().unwrap() - 3.0).abs() < 1e-9);
    assert!(r.confidence < 0.5);
    let stats = router.stats();
    assert_eq!(stats.tasks_failed, 0);
    assert_eq!(stats.tasks_completed, 1);
}

#[tokio::test]
async fn image_model_tasks_degrade_without_backend() {
    let router = MultiModalTaskRouter::with_defaults(&config(2));
    let tasks = [TaskType::Ocr, TaskType::ObjectDetection, TaskType::Captioning];
    let results = router
        .process(Content::new(Modality::Image, png(800, 600)), &tasks)
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    for task in tasks {
        let r = results.iter().find(|r| r.task_type == task).unwrap();
        assert_eq!(r.result["degraded"], true, "{task}");
        assert_eq!(r.result["metadata"]["format"], "png");
        assert_eq!(r.result["metadata"]["height"], 600);
        assert!(r.confidence < 0.5);
    }
    assert_eq!(router.stats().tasks_failed, 0);
}

#[tokio::test]
async fn text_sentiment_and_embedding() {
    let router = MultiModalTaskRouter::with_defaults(&config(2));
    let content = Content::text("The guide was wonderful and the views amazing!", Language::English);
    let results = router
        .process(content, &[TaskType::SentimentAnalysis, TaskType::Embedding, TaskType::Embedding])
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    let sentiment = results
        .iter()
        .find(|r| r.task_type == TaskType::SentimentAnalysis)
        .unwrap();
    assert!(sentiment.result["sentiment_score"].as_f64().unwrap() > 0.0);
    let embedding = results.iter().find(|r| r.task_type == TaskType::Embedding).unwrap();
    assert_eq!(embedding.result["dimensions"], 64);
    assert!(results.iter().all(|r| r.safety_level == SafetyLevel::Safe));
    assert_eq!(results[0].content_digest, results[1].content_digest);
    assert_eq!(results[0].content_digest.len(), 64);
}

#[tokio::test]
async fn empty_content_is_invalid() {
    let router = MultiModalTaskRouter::with_defaults(&config(1));
    let err = router
        .process(Content::new(Modality::Image, Vec::<u8>::new()), &[TaskType::Classification])
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessingError::InvalidContent(_)));
}

#[tokio::test]
async fn timed_out_calls_are_not_cached() {
    let slow = counter(300);
    let executor = TaskExecutor::default().with_backend(slow.clone());
    let router = MultiModalTaskRouter::new(&config(1), executor);

    let err = router
        .process_with_timeout(
            Content::text("hola", Language::Spanish),
            &[TaskType::Embedding],
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessingError::Timeout(_)));

    // Let the abandoned job finish on the worker.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(router.cache_len(), 0);
    let stats = router.stats();
    assert_eq!(stats.timeouts, 1);
    assert_eq!(stats.tasks_completed, 0);
}

#[tokio::test]
async fn concurrency_is_bounded_by_worker_count() {
    let p = counter(20);
    let executor = TaskExecutor::default().with_backend(p.clone());
    let router = MultiModalTaskRouter::new(&config(2), executor);
    assert_eq!(router.workers(), 2);

    let calls = (0..6).map(|i| {
        router.process(Content::text(format!("review {i}"), Language::English), &[TaskType::Embedding])
    });
    let outcomes = join_all(calls).await;

    assert!(outcomes.iter().all(|o| o.is_ok()));
    assert_eq!(p.calls.load(Ordering::SeqCst), 6);
    assert!(p.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(router.stats().tasks_completed, 6);
}

#[tokio::test]
async fn results_can_be_fetched_by_task_id() {
    let router = MultiModalTaskRouter::with_defaults(&config(2));
    let results = router
        .process(Content::text("great tour", Language::English), &[TaskType::KeywordExtraction])
        .await
        .unwrap();
    let id = results[0].task_id;

    assert_eq!(router.cached(&id), Some(results[0].clone()));
    assert_eq!(router.cached(&uuid::Uuid::new_v4()), None);

    let stats = router.stats();
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.cache_misses, 1);
    assert_eq!(stats.completed_by_task[&TaskType::KeywordExtraction], 1);
    router.shutdown().await;
}
