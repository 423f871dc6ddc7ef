use thiserror::Error;

/// Failure taxonomy shared by every analytics component.
///
/// Partial failures (one model, one scorer, one dropped task) are absorbed by
/// the component that hit them and only logged. Everything that reaches a
/// caller through this type means the whole operation failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    /// Too little history for the requested operation.
    #[error("Insufficient data: {0}")]
    DataInsufficiency(String),

    /// Every model in an ensemble failed to train or predict.
    #[error("Model training failed: {0}")]
    ModelTraining(String),

    /// An optional sub-model is not configured.
    #[error("Scorer unavailable: {0}")]
    ScorerUnavailable(String),

    /// Input rejected at the system boundary.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A free-form category string did not match any known variant.
    #[error("Unknown {kind}: '{value}'")]
    UnknownCategory { kind: &'static str, value: String },

    /// The caller's time budget was exceeded.
    #[error("Timed out after {0}ms")]
    Timeout(u64),

    /// A state machine was asked to make a transition it does not allow.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl AnalyticsError {
    pub fn unknown(kind: &'static str, value: impl Into<String>) -> Self {
        AnalyticsError::UnknownCategory {
            kind,
            value: value.into(),
        }
    }
}

impl From<serde_json::Error> for AnalyticsError {
    fn from(e: serde_json::Error) -> Self {
        AnalyticsError::Serialize(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
