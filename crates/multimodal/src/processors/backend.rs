use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Content, Modality, TaskOutput, TaskType};

/// A model-backed processor (vision, speech, moderation service, ...).
///
/// Backends are consulted before the built-in heuristics, so registering a
/// backend for a task the heuristics also cover replaces them.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    fn name(&self) -> &str;

    fn supports(&self, modality: Modality, task: TaskType) -> bool;

    async fn infer(&self, content: &Content, task: TaskType) -> Result<TaskOutput>;
}
