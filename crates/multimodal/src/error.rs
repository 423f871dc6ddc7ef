use std::time::Duration;

use thiserror::Error;

use spirit_core::AnalyticsError;

use crate::types::{Modality, TaskType};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProcessingError {
    /// Every requested task was outside the modality's capability table.
    #[error("no valid tasks for {modality} content (requested: {requested:?})")]
    NoValidTasks {
        modality: Modality,
        requested: Vec<TaskType>,
    },

    #[error("invalid content: {0}")]
    InvalidContent(String),

    /// Neither a backend nor a built-in processor can run the task.
    #[error("no processor available for {task} on {modality} content")]
    ProcessorUnavailable { modality: Modality, task: TaskType },

    #[error("backend '{backend}' failed: {message}")]
    Backend { backend: String, message: String },

    #[error("processing timed out after {0:?}")]
    Timeout(Duration),

    #[error("worker pool is shut down")]
    PoolClosed,

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
}

impl From<ProcessingError> for AnalyticsError {
    fn from(e: ProcessingError) -> Self {
        match e {
            ProcessingError::NoValidTasks { .. } | ProcessingError::InvalidContent(_) => {
                AnalyticsError::Validation(e.to_string())
            }
            ProcessingError::ProcessorUnavailable { .. } | ProcessingError::PoolClosed => {
                AnalyticsError::ScorerUnavailable(e.to_string())
            }
            ProcessingError::Timeout(d) => AnalyticsError::Timeout(d.as_millis() as u64),
            ProcessingError::Analytics(inner) => inner,
            ProcessingError::Backend { .. } => AnalyticsError::ModelTraining(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProcessingError>;
