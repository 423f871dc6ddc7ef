//! Fixed-size worker pool over a bounded FIFO job queue.
//!
//! Workers share one receiver behind an async mutex, so each queued job is
//! taken by exactly one worker. Results go back on a per-job oneshot; a
//! job whose caller has already given up is skipped.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ProcessingError, Result};
use crate::processors::TaskExecutor;
use crate::safety;
use crate::types::{Content, ProcessingResult, TaskType};

pub(crate) struct Job {
    pub task_id: Uuid,
    pub content: Arc<Content>,
    pub content_digest: Arc<str>,
    pub task: TaskType,
    pub reply: oneshot::Sender<Result<ProcessingResult>>,
}

pub struct WorkerPool {
    tx: mpsc::Sender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` tasks on the current tokio runtime.
    pub fn spawn(workers: usize, queue_capacity: usize, executor: Arc<TaskExecutor>) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let workers = (0..workers.max(1))
            .map(|id| {
                let rx = Arc::clone(&rx);
                let executor = Arc::clone(&executor);
                tokio::spawn(worker_loop(id, rx, executor))
            })
            .collect::<Vec<_>>();
        info!(workers = workers.len(), queue_capacity, "multimodal worker pool started");
        Self { tx, workers }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Enqueue a job, waiting for queue space.
    pub(crate) async fn submit(&self, job: Job) -> Result<()> {
        self.tx.send(job).await.map_err(|_| ProcessingError::PoolClosed)
    }

    /// Close the queue and wait for the workers to drain it.
    pub async fn shutdown(self) {
        drop(self.tx);
        for handle in self.workers {
            if let Err(e) = handle.await {
                warn!(error = %e, "worker exited abnormally");
            }
        }
        info!("multimodal worker pool stopped");
    }
}

async fn worker_loop(id: usize, rx: Arc<Mutex<mpsc::Receiver<Job>>>, executor: Arc<TaskExecutor>) {
    loop {
        // The lock is released as soon as one job is taken.
        let job = { rx.lock().await.recv().await };
        let Some(job) = job else {
            debug!(worker = id, "job queue closed");
            break;
        };
        if job.reply.is_closed() {
            debug!(worker = id, task_id = %job.task_id, "caller gone; job abandoned");
            continue;
        }
        let result = run_job(&executor, &job).await;
        if job.reply.send(result).is_err() {
            debug!(worker = id, task_id = %job.task_id, "caller gone; result discarded");
        }
    }
}

async fn run_job(executor: &TaskExecutor, job: &Job) -> Result<ProcessingResult> {
    let start = Instant::now();
    let (processor, output) = executor.execute(&job.content, job.task).await?;
    let processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;
    let safety_level = output
        .safety
        .unwrap_or_else(|| safety::classify(&job.content));
    debug!(
        task_id = %job.task_id,
        task = %job.task,
        processor = %processor,
        elapsed_ms = processing_time_ms,
        "task processed"
    );
    Ok(ProcessingResult {
        task_id: job.task_id,
        modality: job.content.modality,
        task_type: job.task,
        result: output.payload,
        confidence: output.confidence,
        processing_time_ms,
        safety_level,
        processor,
        content_digest: job.content_digest.to_string(),
        created_at: Utc::now(),
    })
}
