//! Multi-modal task routing.
//!
//! This crate provides:
//! - A per-modality capability table (`capabilities`)
//! - `MultiModalTaskRouter`: task validation, a bounded worker pool over a
//!   FIFO job queue, per-call timeouts and a bounded FIFO result cache
//! - Built-in heuristic processors and the `InferenceBackend` trait for
//!   model-backed tasks

pub mod cache;
pub mod capabilities;
pub mod embedding;
pub mod error;
pub mod media;
pub mod pool;
pub mod processors;
pub mod router;
pub mod safety;
pub mod stats;
pub mod types;

pub use error::ProcessingError;
pub use processors::{HeuristicProcessor, InferenceBackend, TaskExecutor};
pub use router::MultiModalTaskRouter;
pub use stats::RouterStats;
pub use types::{Content, Modality, ProcessingResult, SafetyLevel, TaskOutput, TaskType};
