//! Fans live messages out to every registered subscriber.
//!
//! Delivery is best effort and at most once: each subscriber gets one
//! attempt per message, and a subscriber whose send fails is removed on the
//! spot. Subscribers also expire when they stop heartbeating for longer
//! than the registry's TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::traits::{DeliveryResult, LiveMessage, Subscriber};

struct Registration {
    subscriber: Arc<dyn Subscriber>,
    last_heartbeat: Instant,
    subscribed_at: DateTime<Utc>,
}

/// Summary of one registration, for listings.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SubscriberInfo {
    pub id: String,
    pub channel: String,
    pub subscribed_at: DateTime<Utc>,
    pub idle_ms: u64,
}

pub struct SubscriberRegistry {
    subscribers: RwLock<HashMap<String, Registration>>,
    ttl: Duration,
}

impl SubscriberRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Register (or replace) a subscriber under `id`.
    pub async fn subscribe(&self, id: impl Into<String>, subscriber: Arc<dyn Subscriber>) {
        let id = id.into();
        let channel = subscriber.channel_name().to_string();
        self.subscribers.write().await.insert(
            id.clone(),
            Registration {
                subscriber,
                last_heartbeat: Instant::now(),
                subscribed_at: Utc::now(),
            },
        );
        info!(subscriber = %id, channel = %channel, "subscriber registered");
    }

    pub async fn unsubscribe(&self, id: &str) -> bool {
        let removed = self.subscribers.write().await.remove(id).is_some();
        if removed {
            info!(subscriber = %id, "subscriber removed");
        }
        removed
    }

    /// Refresh a subscriber's heartbeat. Returns false for unknown ids.
    pub async fn heartbeat(&self, id: &str) -> bool {
        match self.subscribers.write().await.get_mut(id) {
            Some(reg) => {
                reg.last_heartbeat = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Drop every subscriber whose heartbeat is older than the TTL.
    pub async fn prune_expired(&self) -> Vec<String> {
        let now = Instant::now();
        let mut guard = self.subscribers.write().await;
        let expired: Vec<String> = guard
            .iter()
            .filter(|(_, r)| now.duration_since(r.last_heartbeat) > self.ttl)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            guard.remove(id);
            warn!(subscriber = %id, "subscriber heartbeat expired");
        }
        expired
    }

    /// Deliver `message` to every live subscriber. Failed subscribers are
    /// pruned; nothing is retried.
    pub async fn broadcast(&self, message: &LiveMessage) -> Vec<DeliveryResult> {
        self.prune_expired().await;

        let targets: Vec<(String, Arc<dyn Subscriber>)> = self
            .subscribers
            .read()
            .await
            .iter()
            .map(|(id, r)| (id.clone(), Arc::clone(&r.subscriber)))
            .collect();

        if targets.is_empty() {
            debug!(event = %message.event, "no subscribers");
            return Vec::new();
        }

        let deliveries = targets.iter().map(|(id, sub)| async move {
            let start = std::time::Instant::now();
            let outcome = sub.send(message).await;
            DeliveryResult {
                subscriber_id: id.clone(),
                channel: sub.channel_name().to_string(),
                success: outcome.is_ok(),
                error: outcome.err().map(|e| e.to_string()),
                duration_ms: start.elapsed().as_millis() as u64,
            }
        });
        let results = join_all(deliveries).await;

        let failed: Vec<&DeliveryResult> = results.iter().filter(|r| !r.success).collect();
        if !failed.is_empty() {
            let mut guard = self.subscribers.write().await;
            for r in &failed {
                guard.remove(&r.subscriber_id);
                warn!(
                    subscriber = %r.subscriber_id,
                    channel = %r.channel,
                    error = r.error.as_deref().unwrap_or(""),
                    "delivery failed; subscriber pruned"
                );
            }
        }

        debug!(
            event = %message.event,
            delivered = results.len() - failed.len(),
            failed = failed.len(),
            "broadcast complete"
        );
        results
    }

    pub async fn len(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn list(&self) -> Vec<SubscriberInfo> {
        let now = Instant::now();
        let mut out: Vec<SubscriberInfo> = self
            .subscribers
            .read()
            .await
            .iter()
            .map(|(id, r)| SubscriberInfo {
                id: id.clone(),
                channel: r.subscriber.channel_name().to_string(),
                subscribed_at: r.subscribed_at,
                idle_ms: now.duration_since(r.last_heartbeat).as_millis() as u64,
            })
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}
