//! Sentiment alerts: records, lifecycle and the engine that raises them.

mod engine;
mod policy;

pub use engine::AlertEngine;
pub use policy::AlertPolicy;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spirit_core::{AnalyticsError, Result};

use crate::types::{Emotion, UrgencyLevel};

/// Why an alert fired. An alert carries one reason per triggered rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertReason {
    NegativeSentiment { score: f64, threshold: f64 },
    HighUrgency { urgency: UrgencyLevel },
    IntenseEmotion { emotion: Emotion, intensity: f64 },
    ConsecutiveNegative { count: usize },
}

/// Reason without its payload; cooldowns are tracked per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    NegativeSentiment,
    HighUrgency,
    IntenseEmotion,
    ConsecutiveNegative,
}

impl AlertReason {
    pub fn kind(&self) -> AlertKind {
        match self {
            AlertReason::NegativeSentiment { .. } => AlertKind::NegativeSentiment,
            AlertReason::HighUrgency { .. } => AlertKind::HighUrgency,
            AlertReason::IntenseEmotion { .. } => AlertKind::IntenseEmotion,
            AlertReason::ConsecutiveNegative { .. } => AlertKind::ConsecutiveNegative,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
    FalsePositive,
}

impl AlertStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AlertStatus::Resolved | AlertStatus::FalsePositive)
    }

    /// Allowed moves: active → acknowledged, and active or acknowledged →
    /// resolved / false positive.
    pub fn can_transition(&self, to: AlertStatus) -> bool {
        matches!(
            (self, to),
            (AlertStatus::Active, AlertStatus::Acknowledged)
                | (
                    AlertStatus::Active | AlertStatus::Acknowledged,
                    AlertStatus::Resolved | AlertStatus::FalsePositive
                )
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::Resolved => "resolved",
            AlertStatus::FalsePositive => "false_positive",
        }
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentAlert {
    pub alert_id: Uuid,
    /// Id of the analysis record that raised the alert.
    pub analysis_id: Uuid,
    pub interaction_id: String,
    pub customer_id: String,
    pub severity: AlertSeverity,
    pub reasons: Vec<AlertReason>,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub acknowledged_by: Option<String>,
    #[serde(default)]
    pub resolution_note: Option<String>,
}

impl SentimentAlert {
    fn transition(&mut self, to: AlertStatus) -> Result<()> {
        if !self.status.can_transition(to) {
            return Err(AnalyticsError::InvalidTransition(format!(
                "alert {} cannot move from {} to {}",
                self.alert_id, self.status, to
            )));
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn acknowledge(&mut self, operator: &str) -> Result<()> {
        self.transition(AlertStatus::Acknowledged)?;
        self.acknowledged_by = Some(operator.to_string());
        Ok(())
    }

    pub fn resolve(&mut self, note: &str) -> Result<()> {
        self.close(AlertStatus::Resolved, note)
    }

    pub fn mark_false_positive(&mut self, note: &str) -> Result<()> {
        self.close(AlertStatus::FalsePositive, note)
    }

    fn close(&mut self, to: AlertStatus, note: &str) -> Result<()> {
        let note = note.trim();
        if note.is_empty() {
            return Err(AnalyticsError::Validation(format!(
                "closing alert {} as {} requires an operator note",
                self.alert_id, to
            )));
        }
        self.transition(to)?;
        self.resolution_note = Some(note.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert() -> SentimentAlert {
        let now = Utc::now();
        SentimentAlert {
            alert_id: Uuid::new_v4(),
            analysis_id: Uuid::new_v4(),
            interaction_id: "int-1".into(),
            customer_id: "cust-1".into(),
            severity: AlertSeverity::Medium,
            reasons: vec![AlertReason::NegativeSentiment { score: -0.7, threshold: -0.5 }],
            status: AlertStatus::Active,
            created_at: now,
            updated_at: now,
            acknowledged_by: None,
            resolution_note: None,
        }
    }

    #[test]
    fn acknowledge_then_resolve() {
        let mut a = alert();
        a.acknowledge("ops-maria").unwrap();
        assert_eq!(a.status, AlertStatus::Acknowledged);
        a.resolve("called the customer, refund issued").unwrap();
        assert_eq!(a.status, AlertStatus::Resolved);
        assert_eq!(a.acknowledged_by.as_deref(), Some("ops-maria"));
        assert!(a.resolve("again").is_err());
    }

    #[test]
    fn direct_false_positive() {
        let mut a = alert();
        a.mark_false_positive("sarcasm").unwrap();
        assert_eq!(a.status, AlertStatus::FalsePositive);
        assert!(matches!(a.acknowledge("x"), Err(AnalyticsError::InvalidTransition(_))));
    }

    #[test]
    fn terminal_transitions_need_a_note() {
        let mut a = alert();
        assert!(matches!(a.resolve("  "), Err(AnalyticsError::Validation(_))));
        assert_eq!(a.status, AlertStatus::Active);
    }

    #[test]
    fn reasons_serialize_with_kind_tag() {
        let json = serde_json::to_value(AlertReason::ConsecutiveNegative { count: 3 }).unwrap();
        assert_eq!(json["kind"], "consecutive_negative");
        assert_eq!(json["count"], 3);
    }
}
