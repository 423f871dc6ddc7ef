//! AlertPolicy rule kind: thresholds, streak limit and cooldown for the
//! sentiment alert engine.

use serde::{Deserialize, Serialize};

use crate::schema::CommonMetadata;

// ── YAML-level types ────────────────────────────────────────────────

/// Top-level AlertPolicy rule document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AlertPolicyRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub spec: AlertPolicySpec,
}

/// The `spec` section of an AlertPolicy rule. Every field is optional in
/// YAML and falls back to the built-in policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AlertPolicySpec {
    /// Scores at or below this raise a negative-sentiment alert.
    #[serde(default = "default_negative_threshold")]
    pub negative_threshold: f64,
    /// Scores strictly below this count towards the consecutive-negative streak.
    #[serde(default = "default_streak_threshold")]
    pub streak_threshold: f64,
    /// Minimum dominant-emotion intensity for an emotion alert.
    #[serde(default = "default_emotion_threshold")]
    pub emotion_threshold: f64,
    /// Emotions that can raise an emotion alert.
    #[serde(default = "default_alert_emotions")]
    pub alert_emotions: Vec<String>,
    /// Urgency levels that raise an urgency alert.
    #[serde(default = "default_urgency_levels")]
    pub urgency_levels: Vec<String>,
    #[serde(default = "default_consecutive_limit")]
    pub consecutive_negative_limit: usize,
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: i64,
}

fn default_negative_threshold() -> f64 {
    -0.5
}
fn default_streak_threshold() -> f64 {
    -0.2
}
fn default_emotion_threshold() -> f64 {
    0.7
}
fn default_alert_emotions() -> Vec<String> {
    vec!["anger".into(), "frustration".into(), "fear".into()]
}
fn default_urgency_levels() -> Vec<String> {
    vec!["high".into(), "critical".into()]
}
fn default_consecutive_limit() -> usize {
    3
}
fn default_cooldown_minutes() -> i64 {
    15
}

impl Default for AlertPolicySpec {
    fn default() -> Self {
        Self {
            negative_threshold: default_negative_threshold(),
            streak_threshold: default_streak_threshold(),
            emotion_threshold: default_emotion_threshold(),
            alert_emotions: default_alert_emotions(),
            urgency_levels: default_urgency_levels(),
            consecutive_negative_limit: default_consecutive_limit(),
            cooldown_minutes: default_cooldown_minutes(),
        }
    }
}

// ── Compiled type ───────────────────────────────────────────────────

/// Validated alert policy. Category names are lowercased; the sentiment crate
/// parses them into its own enums.
pub type CompiledAlertPolicy = AlertPolicySpec;

impl AlertPolicyRule {
    /// Validate ranges and normalize names.
    pub fn compile(&self) -> Result<CompiledAlertPolicy, String> {
        let s = &self.spec;
        if !(-1.0..=1.0).contains(&s.negative_threshold) {
            return Err(format!(
                "negative_threshold {} outside [-1, 1]",
                s.negative_threshold
            ));
        }
        if !(-1.0..=1.0).contains(&s.streak_threshold) {
            return Err(format!("streak_threshold {} outside [-1, 1]", s.streak_threshold));
        }
        if s.negative_threshold > s.streak_threshold {
            return Err(format!(
                "negative_threshold {} must not exceed streak_threshold {}",
                s.negative_threshold, s.streak_threshold
            ));
        }
        if !(s.emotion_threshold > 0.0 && s.emotion_threshold <= 1.0) {
            return Err(format!("emotion_threshold {} outside (0, 1]", s.emotion_threshold));
        }
        if s.consecutive_negative_limit == 0 {
            return Err("consecutive_negative_limit must be at least 1".into());
        }
        if s.cooldown_minutes < 0 {
            return Err(format!("cooldown_minutes {} is negative", s.cooldown_minutes));
        }

        let mut compiled = s.clone();
        compiled.alert_emotions = normalize(&s.alert_emotions);
        compiled.urgency_levels = normalize(&s.urgency_levels);
        Ok(compiled)
    }
}

fn normalize(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = names.iter().map(|n| n.trim().to_ascii_lowercase()).collect();
    out.sort();
    out.dedup();
    out
}
