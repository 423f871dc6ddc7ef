//! Routes a (content, task) pair to the processor that runs it.

mod backend;
mod heuristic;

pub use backend::InferenceBackend;
pub use heuristic::HeuristicProcessor;

use std::sync::Arc;

use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::types::{Content, TaskOutput, TaskType};

/// Registered backends first (in registration order), then the built-in
/// heuristics.
#[derive(Clone, Default)]
pub struct TaskExecutor {
    backends: Vec<Arc<dyn InferenceBackend>>,
    heuristics: HeuristicProcessor,
}

impl TaskExecutor {
    pub fn new(heuristics: HeuristicProcessor) -> Self {
        Self {
            backends: Vec::new(),
            heuristics,
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn InferenceBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    pub fn backend_names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }

    /// Run `task` and report which processor produced the output.
    pub async fn execute(&self, content: &Content, task: TaskType) -> Result<(String, TaskOutput)> {
        if let Some(backend) = self
            .backends
            .iter()
            .find(|b| b.supports(content.modality, task))
        {
            debug!(backend = backend.name(), task = %task, "dispatching to backend");
            let output = backend.infer(content, task).await.map_err(|e| match e {
                ProcessingError::Backend { .. } => e,
                other => ProcessingError::Backend {
                    backend: backend.name().to_string(),
                    message: other.to_string(),
                },
            })?;
            return Ok((backend.name().to_string(), output));
        }
        if self.heuristics.supports(content.modality, task) {
            let output = self.heuristics.run(content, task)?;
            return Ok((HeuristicProcessor::NAME.to_string(), output));
        }
        Err(ProcessingError::ProcessorUnavailable {
            modality: content.modality,
            task,
        })
    }
}
