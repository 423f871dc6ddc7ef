//! In-process subscriber backed by a bounded tokio mpsc channel.

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::traits::{LiveMessage, NotifyError, Subscriber};

/// Pushes messages into an mpsc channel without waiting. A full or closed
/// channel is a delivery failure.
#[derive(Debug, Clone)]
pub struct ChannelSubscriber {
    tx: mpsc::Sender<LiveMessage>,
}

impl ChannelSubscriber {
    pub fn new(tx: mpsc::Sender<LiveMessage>) -> Self {
        Self { tx }
    }

    /// Create a subscriber and the receiver it feeds.
    pub fn pair(capacity: usize) -> (Self, mpsc::Receiver<LiveMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }
}

#[async_trait::async_trait]
impl Subscriber for ChannelSubscriber {
    async fn send(&self, message: &LiveMessage) -> Result<(), NotifyError> {
        self.tx.try_send(message.clone()).map_err(|e| match e {
            TrySendError::Full(_) => NotifyError::Closed("receiver is full".into()),
            TrySendError::Closed(_) => NotifyError::Closed("receiver dropped".into()),
        })
    }

    fn channel_name(&self) -> &str {
        "channel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_until_receiver_drops() {
        let (sub, mut rx) = ChannelSubscriber::pair(4);
        let msg = LiveMessage::new("sentiment_update", serde_json::json!({"score": -0.4}));
        sub.send(&msg).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), msg);

        drop(rx);
        assert!(matches!(sub.send(&msg).await, Err(NotifyError::Closed(_))));
    }

    #[tokio::test]
    async fn full_channel_is_a_failure() {
        let (sub, _rx) = ChannelSubscriber::pair(1);
        let msg = LiveMessage::new("sentiment_update", serde_json::Value::Null);
        sub.send(&msg).await.unwrap();
        assert!(sub.send(&msg).await.is_err());
    }
}
