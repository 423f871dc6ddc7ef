//! Pushes each analysis outcome to live subscribers and records it in the
//! customer's trend.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use spirit_notify::{DeliveryResult, LiveMessage, NotifyError, SubscriberRegistry};

use crate::alerts::{AlertSeverity, SentimentAlert};
use crate::trend::{TrendPoint, TrendStore};
use crate::types::{
    ConfidenceLevel, Emotion, Intent, SentimentAnalysisRecord, SentimentLevel, UrgencyLevel,
};

pub const SENTIMENT_UPDATE_EVENT: &str = "sentiment_update";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub overall_sentiment: SentimentLevel,
    pub sentiment_score: f64,
    pub confidence: ConfidenceLevel,
    pub dominant_emotion: Option<Emotion>,
    pub intent: Intent,
    pub urgency_level: UrgencyLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub alert_id: Uuid,
    pub severity: AlertSeverity,
    pub reasons: usize,
}

/// Payload of a `sentiment_update` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentUpdate {
    pub analysis_id: Uuid,
    pub interaction_id: String,
    pub customer_id: String,
    pub sentiment: SentimentSummary,
    #[serde(default)]
    pub alert: Option<AlertSummary>,
}

impl SentimentUpdate {
    pub fn new(record: &SentimentAnalysisRecord, alert: Option<&SentimentAlert>) -> Self {
        let a = &record.analysis;
        Self {
            analysis_id: record.id,
            interaction_id: record.interaction_id.clone(),
            customer_id: record.customer_id.clone(),
            sentiment: SentimentSummary {
                overall_sentiment: a.overall_sentiment,
                sentiment_score: a.sentiment_score,
                confidence: a.confidence,
                dominant_emotion: a.dominant_emotion().map(|(e, _)| e),
                intent: a.intent,
                urgency_level: a.urgency_level,
            },
            alert: alert.map(|al| AlertSummary {
                alert_id: al.alert_id,
                severity: al.severity,
                reasons: al.reasons.len(),
            }),
        }
    }
}

/// Delivery counts for one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

impl From<&[DeliveryResult]> for DispatchReport {
    fn from(results: &[DeliveryResult]) -> Self {
        let delivered = results.iter().filter(|r| r.success).count();
        Self {
            delivered,
            failed: results.len() - delivered,
        }
    }
}

pub struct RealtimeDispatcher {
    registry: Arc<SubscriberRegistry>,
    trend: TrendStore,
}

impl RealtimeDispatcher {
    pub fn new(registry: Arc<SubscriberRegistry>, trend: TrendStore) -> Self {
        Self { registry, trend }
    }

    pub fn registry(&self) -> &Arc<SubscriberRegistry> {
        &self.registry
    }

    pub fn trend(&self) -> &TrendStore {
        &self.trend
    }

    /// Append the record to its customer's trend, then broadcast the update.
    /// Failed subscribers are dropped by the registry; nothing is retried.
    pub async fn dispatch(
        &self,
        record: &SentimentAnalysisRecord,
        alert: Option<&SentimentAlert>,
    ) -> Result<DispatchReport, NotifyError> {
        self.trend.push(&record.customer_id, TrendPoint::from(record));
        self.publish(record, alert).await
    }

    /// Broadcast only, for records already in the trend (the alert engine
    /// appends while it counts the streak).
    pub async fn publish(
        &self,
        record: &SentimentAnalysisRecord,
        alert: Option<&SentimentAlert>,
    ) -> Result<DispatchReport, NotifyError> {
        let update = SentimentUpdate::new(record, alert);
        let message = LiveMessage::from_payload(SENTIMENT_UPDATE_EVENT, &update)?;
        let results = self.registry.broadcast(&message).await;
        let report = DispatchReport::from(results.as_slice());
        debug!(
            interaction = %record.interaction_id,
            delivered = report.delivered,
            failed = report.failed,
            "sentiment update dispatched"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use chrono::Utc;
    use indexmap::IndexMap;
    use spirit_notify::ChannelSubscriber;

    use super::*;
    use crate::language::Language;
    use crate::types::SentimentAnalysis;

    fn record() -> SentimentAnalysisRecord {
        SentimentAnalysisRecord {
            id: Uuid::new_v4(),
            interaction_id: "int-7".into(),
            customer_id: "cust-7".into(),
            language: Language::English,
            channel: Some("chat".into()),
            analysis: SentimentAnalysis {
                overall_sentiment: SentimentLevel::Negative,
                sentiment_score: -0.4,
                subjectivity: 0.6,
                confidence: ConfidenceLevel::Medium,
                scorer_scores: IndexMap::new(),
                emotion_scores: [(Emotion::Anger, 0.5)].into_iter().collect::<BTreeMap<_, _>>(),
                keywords: vec![],
                topics: vec![],
                intent: Intent::Complaint,
                urgency_level: UrgencyLevel::Normal,
            },
            analyzed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn delivers_and_prunes() {
        let registry = Arc::new(SubscriberRegistry::new(Duration::from_secs(60)));
        let (live, mut rx) = ChannelSubscriber::pair(8);
        let (dead, dead_rx) = ChannelSubscriber::pair(8);
        drop(dead_rx);
        registry.subscribe("dashboard", Arc::new(live)).await;
        registry.subscribe("closed", Arc::new(dead)).await;

        let dispatcher = RealtimeDispatcher::new(Arc::clone(&registry), TrendStore::new(50));
        let report = dispatcher.dispatch(&record(), None).await.unwrap();
        assert_eq!(report, DispatchReport { delivered: 1, failed: 1 });
        assert_eq!(registry.len().await, 1);
        assert_eq!(dispatcher.trend().points("cust-7").len(), 1);

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.event, SENTIMENT_UPDATE_EVENT);
        let update: SentimentUpdate = serde_json::from_value(msg.payload).unwrap();
        assert_eq!(update.interaction_id, "int-7");
        assert_eq!(update.sentiment.dominant_emotion, Some(Emotion::Anger));
        assert!(update.alert.is_none());
    }

    #[tokio::test]
    async fn publish_leaves_the_trend_alone() {
        let registry = Arc::new(SubscriberRegistry::new(Duration::from_secs(60)));
        let (live, mut rx) = ChannelSubscriber::pair(8);
        registry.subscribe("dashboard", Arc::new(live)).await;
        let dispatcher = RealtimeDispatcher::new(registry, TrendStore::new(50));
        let report = dispatcher.publish(&record(), None).await.unwrap();
        assert_eq!(report.delivered, 1);
        assert!(dispatcher.trend().points("cust-7").is_empty());
        assert_eq!(rx.recv().await.unwrap().event, SENTIMENT_UPDATE_EVENT);
    }

    #[tokio::test]
    async fn no_subscribers_still_records_trend() {
        let registry = Arc::new(SubscriberRegistry::new(Duration::from_secs(60)));
        let dispatcher = RealtimeDispatcher::new(registry, TrendStore::new(50));
        let report = dispatcher.dispatch(&record(), None).await.unwrap();
        assert_eq!(report, DispatchReport::default());
        assert_eq!(dispatcher.trend().summary("cust-7").unwrap().samples, 1);
    }
}
