use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{ProcessingResult, TaskType};

/// Router counters since startup.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RouterStats {
    pub calls: u64,
    pub calls_failed: u64,
    pub tasks_dropped: u64,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub timeouts: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_evictions: u64,
    /// Mean processing time of completed tasks in milliseconds.
    pub avg_processing_ms: f64,
    pub completed_by_task: BTreeMap<TaskType, u64>,

    #[serde(skip)]
    total_processing_ms: f64,
}

impl RouterStats {
    pub fn record_completed(&mut self, result: &ProcessingResult) {
        self.tasks_completed += 1;
        self.total_processing_ms += result.processing_time_ms;
        self.avg_processing_ms = self.total_processing_ms / self.tasks_completed as f64;
        *self.completed_by_task.entry(result.task_type).or_insert(0) += 1;
    }
}
