use std::collections::BTreeSet;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use spirit_core::{AnalyticsError, PredictionTarget, Result};

use crate::models::{ModelKind, ModelPerformance};

// ── Request ───────────────────────────────────────────────────

/// Parameters of one forecasting run. Validated on construction and only
/// ever borrowed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionConfig {
    pub model_set: BTreeSet<ModelKind>,
    pub target: PredictionTarget,
    pub horizon: usize,
    pub confidence_level: f64,
    pub auto_tune: bool,
}

impl PredictionConfig {
    pub fn new(
        target: PredictionTarget,
        model_set: impl IntoIterator<Item = ModelKind>,
        horizon: usize,
        confidence_level: f64,
        auto_tune: bool,
    ) -> Result<Self> {
        let config = Self {
            model_set: model_set.into_iter().collect(),
            target,
            horizon,
            confidence_level,
            auto_tune,
        };
        config.validate()?;
        Ok(config)
    }

    /// Every model, default confidence, no tuning.
    pub fn with_defaults(target: PredictionTarget, horizon: usize) -> Result<Self> {
        Self::new(target, ModelKind::ALL, horizon, 0.95, false)
    }

    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(AnalyticsError::Validation("horizon must be positive".into()));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(AnalyticsError::Validation(format!(
                "confidence level {} not in (0, 1)",
                self.confidence_level
            )));
        }
        if self.model_set.is_empty() {
            return Err(AnalyticsError::Validation("model set is empty".into()));
        }
        Ok(())
    }

    /// Stable SHA-256 of the configuration, used as the model store key.
    pub fn config_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.target.as_str().as_bytes());
        for model in &self.model_set {
            hasher.update(b"|");
            hasher.update(model.as_str().as_bytes());
        }
        hasher.update(format!("|h={}|c={}|t={}", self.horizon, self.confidence_level, self.auto_tune));
        format!("{:x}", hasher.finalize())
    }
}

// ── Anomalies ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalySeverity {
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    ZScore,
    IsolationForest,
    SuddenChange,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMethod::ZScore => "z_score",
            DetectionMethod::IsolationForest => "isolation_forest",
            DetectionMethod::SuddenChange => "sudden_change",
        }
    }
}

/// One flagged point. Created by the detector, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub index: usize,
    pub date: Option<NaiveDate>,
    pub value: f64,
    /// Every method that flagged this point, in detection order.
    pub methods: Vec<DetectionMethod>,
    pub severity: AnomalySeverity,
}

impl AnomalyRecord {
    /// The method that flagged the point first.
    pub fn method(&self) -> Option<DetectionMethod> {
        self.methods.first().copied()
    }
}

// ── Result ────────────────────────────────────────────────────

/// Forecast mean compared against the most recent history of equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineComparison {
    pub baseline_mean: f64,
    pub forecast_mean: f64,
    pub delta: f64,
    /// `None` when the baseline mean is zero.
    pub delta_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub level: f64,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Output of one facade call. Owned by the caller; never partially built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub target: PredictionTarget,
    pub predictions: Vec<f64>,
    pub confidence_interval: ConfidenceInterval,
    pub forecast_dates: Vec<NaiveDate>,
    /// Normalized to sum to 1 when non-empty.
    pub feature_importance: IndexMap<String, f64>,
    pub model_performance: IndexMap<String, ModelPerformance>,
    pub model_weights: IndexMap<String, f64>,
    pub anomalies: Vec<AnomalyRecord>,
    pub recommendations: Vec<String>,
    pub baseline: BaselineComparison,
    /// Models dropped from the ensemble with the reason.
    pub excluded_models: IndexMap<String, String>,
}

impl PredictionResult {
    pub fn horizon(&self) -> usize {
        self.predictions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_configs() {
        let t = PredictionTarget::Demand;
        assert!(PredictionConfig::new(t, ModelKind::ALL, 0, 0.95, false).is_err());
        assert!(PredictionConfig::new(t, ModelKind::ALL, 30, 1.0, false).is_err());
        assert!(PredictionConfig::new(t, ModelKind::ALL, 30, 0.0, false).is_err());
        assert!(PredictionConfig::new(t, Vec::new(), 30, 0.95, false).is_err());
        assert!(PredictionConfig::new(t, ModelKind::ALL, 30, 0.9, true).is_ok());
    }

    #[test]
    fn config_hash_is_stable_and_sensitive() {
        let a = PredictionConfig::with_defaults(PredictionTarget::Demand, 30).unwrap();
        let b = PredictionConfig::with_defaults(PredictionTarget::Demand, 30).unwrap();
        let c = PredictionConfig::with_defaults(PredictionTarget::Revenue, 30).unwrap();
        assert_eq!(a.config_hash(), b.config_hash());
        assert_ne!(a.config_hash(), c.config_hash());
        assert_eq!(a.config_hash().len(), 64);
    }
}
