use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use sha2::{Digest, Sha256};
use tokio::sync::oneshot;
use tracing::{info, warn};
use uuid::Uuid;

use spirit_core::config::MultimodalConfig;

use crate::cache::ResultCache;
use crate::capabilities;
use crate::error::{ProcessingError, Result};
use crate::pool::{Job, WorkerPool};
use crate::processors::TaskExecutor;
use crate::stats::RouterStats;
use crate::types::{Content, ProcessingResult, TaskType};

/// Validates tasks against the capability table, fans them out to the
/// worker pool and caches what comes back.
pub struct MultiModalTaskRouter {
    pool: WorkerPool,
    cache: ResultCache,
    stats: Mutex<RouterStats>,
    timeout: Duration,
}

impl MultiModalTaskRouter {
    /// Must be called inside a tokio runtime; spawns the worker pool.
    pub fn new(config: &MultimodalConfig, executor: TaskExecutor) -> Self {
        Self {
            pool: WorkerPool::spawn(config.workers, config.queue_capacity, Arc::new(executor)),
            cache: ResultCache::new(config.cache_capacity),
            stats: Mutex::new(RouterStats::default()),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn with_defaults(config: &MultimodalConfig) -> Self {
        Self::new(config, TaskExecutor::default())
    }

    /// Process `content` for every supported task in `tasks` under the
    /// configured timeout.
    pub async fn process(&self, content: Content, tasks: &[TaskType]) -> Result<Vec<ProcessingResult>> {
        self.process_with_timeout(content, tasks, self.timeout).await
    }

    /// Unsupported tasks are dropped. With no task left, or when every task
    /// fails, the call fails. On timeout all of the call's jobs are
    /// abandoned and nothing is cached.
    pub async fn process_with_timeout(
        &self,
        content: Content,
        tasks: &[TaskType],
        budget: Duration,
    ) -> Result<Vec<ProcessingResult>> {
        let (valid, dropped) = capabilities::partition(content.modality, tasks);
        {
            let mut stats = self.lock_stats();
            stats.calls += 1;
            stats.tasks_dropped += dropped.len() as u64;
        }
        if valid.is_empty() {
            self.lock_stats().calls_failed += 1;
            return Err(ProcessingError::NoValidTasks {
                modality: content.modality,
                requested: tasks.to_vec(),
            });
        }
        if content.is_empty() {
            self.lock_stats().calls_failed += 1;
            return Err(ProcessingError::InvalidContent("content is empty".into()));
        }

        let modality = content.modality;
        let digest: Arc<str> = format!("{:x}", Sha256::digest(&content.data)).into();
        let content = Arc::new(content);

        let run = async {
            let mut replies = Vec::with_capacity(valid.len());
            for &task in &valid {
                let (reply, rx) = oneshot::channel();
                self.pool
                    .submit(Job {
                        task_id: Uuid::new_v4(),
                        content: Arc::clone(&content),
                        content_digest: Arc::clone(&digest),
                        task,
                        reply,
                    })
                    .await?;
                replies.push((task, rx));
            }
            let outcomes = join_all(replies.into_iter().map(|(task, rx)| async move {
                match rx.await {
                    Ok(outcome) => (task, outcome),
                    Err(_) => (task, Err(ProcessingError::PoolClosed)),
                }
            }))
            .await;
            Ok::<_, ProcessingError>(outcomes)
        };

        let outcomes = match tokio::time::timeout(budget, run).await {
            Ok(Ok(outcomes)) => outcomes,
            Ok(Err(e)) => {
                self.lock_stats().calls_failed += 1;
                return Err(e);
            }
            Err(_) => {
                let mut stats = self.lock_stats();
                stats.timeouts += 1;
                stats.calls_failed += 1;
                warn!(
                    modality = %modality,
                    tasks = valid.len(),
                    budget_ms = budget.as_millis() as u64,
                    "multimodal call timed out; jobs abandoned"
                );
                return Err(ProcessingError::Timeout(budget));
            }
        };

        let mut results = Vec::with_capacity(outcomes.len());
        let mut first_error = None;
        for (task, outcome) in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(modality = %modality, task = %task, error = %e, "task failed");
                    self.lock_stats().tasks_failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }
        if results.is_empty() {
            self.lock_stats().calls_failed += 1;
            return Err(first_error.unwrap_or(ProcessingError::PoolClosed));
        }

        let mut stats = self.lock_stats();
        for result in &results {
            stats.cache_evictions += self.cache.insert(result.clone()) as u64;
            stats.record_completed(result);
        }
        info!(
            modality = %modality,
            completed = results.len(),
            dropped = dropped.len(),
            "multimodal call finished"
        );
        Ok(results)
    }

    /// Cached result for `task_id`, if still held.
    pub fn cached(&self, task_id: &Uuid) -> Option<ProcessingResult> {
        let hit = self.cache.get(task_id);
        let mut stats = self.lock_stats();
        if hit.is_some() {
            stats.cache_hits += 1;
        } else {
            stats.cache_misses += 1;
        }
        hit
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn workers(&self) -> usize {
        self.pool.size()
    }

    pub fn stats(&self) -> RouterStats {
        self.lock_stats().clone()
    }

    pub async fn shutdown(self) {
        self.pool.shutdown().await;
    }

    fn lock_stats(&self) -> std::sync::MutexGuard<'_, RouterStats> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }
}
