//! Multi-kind rule document container and accessors.

use super::{CommonMetadata, RuleKind};
use crate::alert_policy::AlertPolicyRule;
use crate::forecast_profile::ForecastProfileRule;
use crate::sentiment_lexicon::SentimentLexiconRule;

/// A fully deserialized rule of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleDocument {
    /// Alert thresholds, cooldown and streak limit for the sentiment alert engine.
    AlertPolicy(AlertPolicyRule),
    /// Model set, horizon and confidence for one prediction target.
    ForecastProfile(ForecastProfileRule),
    /// Extra lexicon valences and topic vocabulary for one language.
    SentimentLexicon(SentimentLexiconRule),
}

impl RuleDocument {
    /// Get the rule's metadata regardless of kind.
    pub fn metadata(&self) -> &CommonMetadata {
        match self {
            RuleDocument::AlertPolicy(rule) => &rule.metadata,
            RuleDocument::ForecastProfile(rule) => &rule.metadata,
            RuleDocument::SentimentLexicon(rule) => &rule.metadata,
        }
    }

    /// Get the rule kind.
    pub fn kind(&self) -> RuleKind {
        match self {
            RuleDocument::AlertPolicy(_) => RuleKind::AlertPolicy,
            RuleDocument::ForecastProfile(_) => RuleKind::ForecastProfile,
            RuleDocument::SentimentLexicon(_) => RuleKind::SentimentLexicon,
        }
    }

    pub fn as_alert_policy(&self) -> Option<&AlertPolicyRule> {
        match self {
            RuleDocument::AlertPolicy(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn as_forecast_profile(&self) -> Option<&ForecastProfileRule> {
        match self {
            RuleDocument::ForecastProfile(rule) => Some(rule),
            _ => None,
        }
    }

    pub fn as_sentiment_lexicon(&self) -> Option<&SentimentLexiconRule> {
        match self {
            RuleDocument::SentimentLexicon(rule) => Some(rule),
            _ => None,
        }
    }

    /// Serialize this document to JSON, delegating to the inner type.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            RuleDocument::AlertPolicy(r) => serde_json::to_value(r),
            RuleDocument::ForecastProfile(r) => serde_json::to_value(r),
            RuleDocument::SentimentLexicon(r) => serde_json::to_value(r),
        }
    }

    /// Serialize this document to YAML, delegating to the inner type.
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        match self {
            RuleDocument::AlertPolicy(r) => serde_yaml::to_string(r),
            RuleDocument::ForecastProfile(r) => serde_yaml::to_string(r),
            RuleDocument::SentimentLexicon(r) => serde_yaml::to_string(r),
        }
    }
}
