//! ForecastProfile rule kind: per-target model set, horizon and confidence.

use serde::{Deserialize, Serialize};

use spirit_core::PredictionTarget;

use crate::schema::CommonMetadata;

// ── YAML-level types ────────────────────────────────────────────────

/// Top-level ForecastProfile rule document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ForecastProfileRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub spec: ForecastProfileSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ForecastProfileSpec {
    /// `demand`, `revenue`, `occupancy` or `pricing`.
    pub target: String,
    /// Model names; empty means every registered model.
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub horizon: Option<usize>,
    #[serde(default)]
    pub confidence_level: Option<f64>,
    #[serde(default)]
    pub auto_tune: Option<bool>,
}

// ── Compiled type ───────────────────────────────────────────────────

/// Profile with a parsed target. Model names are lowercased but left as
/// strings; the compute crate resolves them against its model registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledForecastProfile {
    pub id: String,
    pub target: PredictionTarget,
    pub models: Vec<String>,
    pub horizon: Option<usize>,
    pub confidence_level: Option<f64>,
    pub auto_tune: Option<bool>,
}

impl ForecastProfileRule {
    pub fn compile(&self) -> Result<CompiledForecastProfile, String> {
        let target: PredictionTarget = self.spec.target.parse().map_err(|e| format!("{e}"))?;
        if self.spec.horizon == Some(0) {
            return Err("horizon must be positive".into());
        }
        if let Some(c) = self.spec.confidence_level {
            if !(c > 0.0 && c < 1.0) {
                return Err(format!("confidence_level {c} outside (0, 1)"));
            }
        }
        Ok(CompiledForecastProfile {
            id: self.metadata.id.clone(),
            target,
            models: self
                .spec
                .models
                .iter()
                .map(|m| m.trim().to_ascii_lowercase())
                .collect(),
            horizon: self.spec.horizon,
            confidence_level: self.spec.confidence_level,
            auto_tune: self.spec.auto_tune,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_demand_profile() {
        let yaml = include_str!("../../../data/rules/forecast/demand.yml");
        let rule: ForecastProfileRule = serde_yaml::from_str(yaml).unwrap();
        let compiled = rule.compile().unwrap();
        assert_eq!(compiled.target, PredictionTarget::Demand);
        assert_eq!(compiled.horizon, Some(30));
        assert!(compiled.models.contains(&"holt_winters".to_string()));
    }

    #[test]
    fn unknown_target_is_rejected() {
        let yaml = r#"
apiVersion: v1
kind: ForecastProfile
metadata:
  id: bad
  name: Bad
spec:
  target: weather
"#;
        let rule: ForecastProfileRule = serde_yaml::from_str(yaml).unwrap();
        assert!(rule.compile().unwrap_err().contains("weather"));
    }

    #[test]
    fn confidence_bounds() {
        let yaml = include_str!("../../../data/rules/forecast/revenue.yml");
        let mut rule: ForecastProfileRule = serde_yaml::from_str(yaml).unwrap();
        rule.spec.confidence_level = Some(1.0);
        assert!(rule.compile().is_err());
        rule.spec.confidence_level = Some(0.8);
        rule.spec.horizon = Some(0);
        assert!(rule.compile().is_err());
    }
}
