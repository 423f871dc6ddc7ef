//! Subscriber trait definition and shared error types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur during live message delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The receiving end is gone or not keeping up.
    #[error("Channel closed: {0}")]
    Closed(String),

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// One update pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveMessage {
    pub id: Uuid,
    /// Event name, e.g. `sentiment_update`.
    pub event: String,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl LiveMessage {
    pub fn new(event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            event: event.into(),
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Wrap any serializable payload.
    pub fn from_payload<T: Serialize>(event: impl Into<String>, payload: &T) -> Result<Self, NotifyError> {
        Ok(Self::new(event, serde_json::to_value(payload)?))
    }
}

/// A delivery channel for live messages.
#[async_trait::async_trait]
pub trait Subscriber: Send + Sync {
    /// Deliver one message. Any error gets the subscriber pruned.
    async fn send(&self, message: &LiveMessage) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g. "channel", "webhook").
    fn channel_name(&self) -> &str;
}

/// Result of delivering a message to a single subscriber.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryResult {
    pub subscriber_id: String,
    pub channel: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
