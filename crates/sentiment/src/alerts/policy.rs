use std::collections::BTreeSet;

use chrono::Duration;

use spirit_core::config::SentimentConfig;
use spirit_core::{AnalyticsError, Result};
use spirit_rules::alert_policy::CompiledAlertPolicy;

use crate::types::{Emotion, UrgencyLevel};

/// Thresholds the alert engine applies to each analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertPolicy {
    /// Scores at or below this raise a negative-sentiment alert.
    pub negative_threshold: f64,
    /// Scores strictly below this extend a customer's negative streak.
    pub streak_threshold: f64,
    pub emotion_threshold: f64,
    pub alert_emotions: BTreeSet<Emotion>,
    pub urgency_levels: BTreeSet<UrgencyLevel>,
    pub consecutive_negative_limit: usize,
    pub cooldown: Duration,
}

impl AlertPolicy {
    pub fn from_config(config: &SentimentConfig) -> Self {
        Self {
            negative_threshold: config.negative_threshold,
            streak_threshold: config.streak_threshold,
            emotion_threshold: config.emotion_threshold,
            alert_emotions: [Emotion::Anger, Emotion::Frustration, Emotion::Fear]
                .into_iter()
                .collect(),
            urgency_levels: [UrgencyLevel::High, UrgencyLevel::Critical].into_iter().collect(),
            consecutive_negative_limit: config.consecutive_negative_limit.max(1),
            cooldown: Duration::minutes(config.cooldown_minutes.max(0)),
        }
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self::from_config(&SentimentConfig::default())
    }
}

impl TryFrom<&CompiledAlertPolicy> for AlertPolicy {
    type Error = AnalyticsError;

    fn try_from(rule: &CompiledAlertPolicy) -> Result<Self> {
        Ok(Self {
            negative_threshold: rule.negative_threshold,
            streak_threshold: rule.streak_threshold,
            emotion_threshold: rule.emotion_threshold,
            alert_emotions: rule
                .alert_emotions
                .iter()
                .map(|e| e.parse())
                .collect::<Result<_>>()?,
            urgency_levels: rule
                .urgency_levels
                .iter()
                .map(|u| u.parse())
                .collect::<Result<_>>()?,
            consecutive_negative_limit: rule.consecutive_negative_limit,
            cooldown: Duration::minutes(rule.cooldown_minutes),
        })
    }
}
