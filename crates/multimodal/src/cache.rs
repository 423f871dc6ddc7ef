use std::sync::Mutex;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::types::ProcessingResult;

/// Bounded FIFO cache of results keyed by task id. Once full, each insert
/// evicts the oldest entry.
#[derive(Debug)]
pub struct ResultCache {
    capacity: usize,
    entries: Mutex<IndexMap<Uuid, ProcessingResult>>,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(IndexMap::with_capacity(capacity.min(1024))),
        }
    }

    /// Insert `result`; returns how many entries were evicted.
    pub fn insert(&self, result: ProcessingResult) -> usize {
        if self.capacity == 0 {
            return 0;
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut evicted = 0;
        if !entries.contains_key(&result.task_id) {
            while entries.len() >= self.capacity {
                entries.shift_remove_index(0);
                evicted += 1;
            }
        }
        entries.insert(result.task_id, result);
        evicted
    }

    pub fn get(&self, task_id: &Uuid) -> Option<ProcessingResult> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(task_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::types::{Modality, SafetyLevel, TaskType};

    fn result() -> ProcessingResult {
        ProcessingResult {
            task_id: Uuid::new_v4(),
            modality: Modality::Text,
            task_type: TaskType::Embedding,
            result: json!({}),
            confidence: 1.0,
            processing_time_ms: 0.1,
            safety_level: SafetyLevel::Safe,
            processor: "heuristic".into(),
            content_digest: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn evicts_oldest_first() {
        let cache = ResultCache::new(2);
        let (a, b, c) = (result(), result(), result());
        assert_eq!(cache.insert(a.clone()), 0);
        cache.insert(b.clone());
        assert_eq!(cache.insert(c.clone()), 1);
        assert!(cache.get(&a.task_id).is_none());
        assert!(cache.get(&b.task_id).is_some());
        assert!(cache.get(&c.task_id).is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let cache = ResultCache::new(0);
        cache.insert(result());
        assert!(cache.is_empty());
    }
}
