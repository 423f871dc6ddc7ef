//! Built-in processors that need no model: sentiment and keywords via the
//! sentiment analyzer, header inspection for media, histogram embeddings
//! and term-based moderation.
//!
//! Tasks that genuinely need a model (transcription, OCR, detection,
//! captioning, scene cuts) get a degraded answer when no backend is
//! registered: the media metadata that can be read from headers, an empty
//! result, a low confidence and `"degraded": true`.

use serde_json::json;

use spirit_core::AnalyticsError;
use spirit_sentiment::{ConfidenceLevel, Language, SentimentAnalyzer};

use crate::embedding;
use crate::error::{ProcessingError, Result};
use crate::media;
use crate::safety;
use crate::types::{Content, Modality, TaskOutput, TaskType};

/// Confidence reported for results derived from container headers.
const HEADER_CONFIDENCE: f64 = 0.9;
const MODERATION_CONFIDENCE: f64 = 0.6;
/// Confidence reported for degraded model-task results.
pub const DEGRADED_CONFIDENCE: f64 = 0.2;

#[derive(Clone, Default)]
pub struct HeuristicProcessor {
    analyzer: SentimentAnalyzer,
}

impl HeuristicProcessor {
    pub const NAME: &'static str = "heuristic";

    pub fn new(analyzer: SentimentAnalyzer) -> Self {
        Self { analyzer }
    }

    pub fn supports(&self, modality: Modality, task: TaskType) -> bool {
        use TaskType::*;
        match modality {
            Modality::Text => matches!(
                task,
                SentimentAnalysis | KeywordExtraction | Classification | ContentModeration | Embedding
            ),
            Modality::Image => matches!(
                task,
                Classification | Ocr | ObjectDetection | Captioning | ContentModeration | Embedding
            ),
            Modality::Video => matches!(
                task,
                Classification | ObjectDetection | SceneDetection | ContentModeration | Embedding
            ),
            Modality::Audio => matches!(
                task,
                SpeechToText | AudioClassification | ContentModeration | Embedding
            ),
        }
    }

    pub fn run(&self, content: &Content, task: TaskType) -> Result<TaskOutput> {
        if content.is_empty() {
            return Err(ProcessingError::InvalidContent("content is empty".into()));
        }
        match (content.modality, task) {
            (_, TaskType::Embedding) => Ok(self.embedding(content)?),
            (_, TaskType::ContentModeration) => Ok(self.moderation(content)),
            (Modality::Text, TaskType::SentimentAnalysis) => self.sentiment(content),
            (Modality::Text, TaskType::KeywordExtraction) => self.keywords(content),
            (Modality::Text, TaskType::Classification) => self.text_classification(content),
            (Modality::Image, TaskType::Classification) => Ok(image_classification(content)),
            (Modality::Video, TaskType::Classification) => Ok(video_classification(content)),
            (Modality::Audio, TaskType::AudioClassification) => Ok(audio_classification(content)),
            (Modality::Audio, TaskType::SpeechToText)
            | (Modality::Image, TaskType::Ocr | TaskType::ObjectDetection | TaskType::Captioning)
            | (Modality::Video, TaskType::ObjectDetection | TaskType::SceneDetection) => {
                Ok(degraded(content, task))
            }
            (modality, task) => Err(ProcessingError::ProcessorUnavailable { modality, task }),
        }
    }

    fn language(content: &Content) -> Language {
        content.language.unwrap_or_default()
    }

    fn sentiment(&self, content: &Content) -> Result<TaskOutput> {
        let analysis = self.analyzer.analyze(content.as_text()?, Self::language(content))?;
        let confidence = confidence_value(analysis.confidence);
        let payload = serde_json::to_value(&analysis).map_err(AnalyticsError::from)?;
        Ok(TaskOutput::new(payload, confidence))
    }

    fn keywords(&self, content: &Content) -> Result<TaskOutput> {
        let analysis = self.analyzer.analyze(content.as_text()?, Self::language(content))?;
        Ok(TaskOutput::new(
            json!({ "keywords": analysis.keywords, "topics": analysis.topics }),
            confidence_value(analysis.confidence),
        ))
    }

    fn text_classification(&self, content: &Content) -> Result<TaskOutput> {
        let analysis = self.analyzer.analyze(content.as_text()?, Self::language(content))?;
        Ok(TaskOutput::new(
            json!({
                "intent": analysis.intent,
                "urgency": analysis.urgency_level,
                "sentiment": analysis.overall_sentiment,
            }),
            confidence_value(analysis.confidence),
        ))
    }

    fn embedding(&self, content: &Content) -> Result<TaskOutput> {
        let vector = match content.modality {
            Modality::Text => embedding::text_histogram(content.as_text()?),
            _ => embedding::byte_histogram(&content.data),
        };
        Ok(TaskOutput::new(
            json!({ "dimensions": vector.len(), "vector": vector, "method": "histogram" }),
            1.0,
        ))
    }

    fn moderation(&self, content: &Content) -> TaskOutput {
        let level = safety::classify(content);
        TaskOutput::new(json!({ "safety_level": level }), MODERATION_CONFIDENCE).with_safety(level)
    }
}

fn confidence_value(level: ConfidenceLevel) -> f64 {
    match level {
        ConfidenceLevel::High => 0.9,
        ConfidenceLevel::Medium => 0.7,
        ConfidenceLevel::Low => 0.5,
        ConfidenceLevel::VeryLow => 0.3,
    }
}

fn orientation(width: u32, height: u32) -> &'static str {
    match width.cmp(&height) {
        std::cmp::Ordering::Greater => "landscape",
        std::cmp::Ordering::Less => "portrait",
        std::cmp::Ordering::Equal => "square",
    }
}

fn unrecognized(content: &Content) -> TaskOutput {
    TaskOutput::new(
        json!({ "format": "unknown", "bytes": content.len(), "mime_type": content.mime_type }),
        0.1,
    )
}

fn image_classification(content: &Content) -> TaskOutput {
    let Some(info) = media::sniff_image(&content.data) else {
        return unrecognized(content);
    };
    let mut payload = json!({
        "format": info.format,
        "width": info.width,
        "height": info.height,
        "bytes": content.len(),
    });
    if let (Some(w), Some(h)) = (info.width, info.height) {
        payload["orientation"] = json!(orientation(w, h));
        payload["megapixels"] = json!(f64::from(w) * f64::from(h) / 1e6);
    }
    TaskOutput::new(payload, HEADER_CONFIDENCE)
}

fn audio_classification(content: &Content) -> TaskOutput {
    match media::sniff_audio(&content.data) {
        Some(info) => TaskOutput::new(json!(info), HEADER_CONFIDENCE),
        None => unrecognized(content),
    }
}

fn video_classification(content: &Content) -> TaskOutput {
    match media::sniff_video(&content.data) {
        Some(info) => TaskOutput::new(json!(info), HEADER_CONFIDENCE),
        None => unrecognized(content),
    }
}

/// Header metadata for any media modality, `None` for text or unknown bytes.
fn media_metadata(content: &Content) -> Option<serde_json::Value> {
    match content.modality {
        Modality::Image => media::sniff_image(&content.data).map(|i| json!(i)),
        Modality::Audio => media::sniff_audio(&content.data).map(|i| json!(i)),
        Modality::Video => media::sniff_video(&content.data).map(|i| json!(i)),
        Modality::Text => None,
    }
}

fn degraded(content: &Content, task: TaskType) -> TaskOutput {
    let metadata = media_metadata(content)
        .unwrap_or_else(|| json!({ "format": "unknown", "mime_type": content.mime_type }));
    let mut payload = json!({
        "degraded": true,
        "reason": "model_unavailable",
        "task": task.to_string(),
        "bytes": content.len(),
        "metadata": metadata,
    });
    match task {
        TaskType::SpeechToText => {
            payload["text"] = json!("");
            payload["duration_secs"] = payload["metadata"]["duration_secs"].clone();
        }
        TaskType::Ocr => payload["text"] = json!(""),
        TaskType::ObjectDetection => payload["objects"] = json!([]),
        TaskType::Captioning => payload["caption"] = serde_json::Value::Null,
        TaskType::SceneDetection => payload["scenes"] = json!([]),
        _ => {}
    }
    TaskOutput::new(payload, DEGRADED_CONFIDENCE)
}
