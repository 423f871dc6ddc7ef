//! Predictive analytics facade: the four public operations of the compute
//! crate, each running the forecast pipeline under a time budget.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use spirit_core::config::ForecastConfig;
use spirit_core::{AnalyticsError, PredictionTarget, Result, TimeSeriesFrame};
use spirit_rules::forecast_profile::CompiledForecastProfile;

use crate::models::ModelKind;
use crate::pipeline::anomaly::{AnomalyDetector, SeriesKind};
use crate::pipeline::features::FeatureContext;
use crate::pipeline::metrics::PipelineMetrics;
use crate::pipeline::ForecastPipeline;
use crate::pricing::{optimize_product, PricingRecommendation, ProductPricing};
use crate::store::{ModelStore, SharedModelStore};
use crate::types::{AnomalyRecord, PredictionConfig, PredictionResult};

/// Per-target forecast settings. Built from the global forecast config and
/// optionally overridden by a `ForecastProfile` rule.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetProfile {
    pub models: BTreeSet<ModelKind>,
    pub horizon: usize,
    pub confidence_level: f64,
    pub auto_tune: bool,
}

impl TargetProfile {
    pub fn from_config(config: &ForecastConfig) -> Self {
        Self {
            models: ModelKind::ALL.into_iter().collect(),
            horizon: config.default_horizon,
            confidence_level: config.confidence_level,
            auto_tune: config.auto_tune,
        }
    }

    /// Apply a compiled profile on top of `base`. Unknown model names fail.
    pub fn overlay(base: &TargetProfile, profile: &CompiledForecastProfile) -> Result<Self> {
        let models = if profile.models.is_empty() {
            base.models.clone()
        } else {
            profile
                .models
                .iter()
                .map(|m| m.parse::<ModelKind>())
                .collect::<Result<BTreeSet<_>>>()?
        };
        Ok(Self {
            models,
            horizon: profile.horizon.unwrap_or(base.horizon),
            confidence_level: profile.confidence_level.unwrap_or(base.confidence_level),
            auto_tune: profile.auto_tune.unwrap_or(base.auto_tune),
        })
    }
}

pub struct PredictiveAnalytics {
    config: ForecastConfig,
    store: SharedModelStore,
    pipeline: ForecastPipeline,
    detector: AnomalyDetector,
    profiles: HashMap<PredictionTarget, TargetProfile>,
    metrics: Arc<Mutex<PipelineMetrics>>,
}

impl PredictiveAnalytics {
    pub fn new(config: ForecastConfig) -> Self {
        Self::with_store(config, ModelStore::shared())
    }

    /// Share a model store with other facades (e.g. one per worker).
    pub fn with_store(config: ForecastConfig, store: SharedModelStore) -> Self {
        let detector = AnomalyDetector::new(config.anomaly_sensitivity);
        Self {
            pipeline: ForecastPipeline::new(Arc::clone(&store), detector.clone()),
            detector,
            store,
            profiles: HashMap::new(),
            metrics: Arc::new(Mutex::new(PipelineMetrics::default())),
            config,
        }
    }

    /// Install per-target profiles. Later profiles for the same target win.
    pub fn with_profiles(mut self, profiles: &[CompiledForecastProfile]) -> Result<Self> {
        let base = TargetProfile::from_config(&self.config);
        for profile in profiles {
            let resolved = TargetProfile::overlay(&base, profile)?;
            info!(
                profile = %profile.id,
                target_name = %profile.target,
                models = resolved.models.len(),
                horizon = resolved.horizon,
                "forecast profile installed"
            );
            self.profiles.insert(profile.target, resolved);
        }
        Ok(self)
    }

    pub fn profile(&self, target: PredictionTarget) -> TargetProfile {
        self.profiles
            .get(&target)
            .cloned()
            .unwrap_or_else(|| TargetProfile::from_config(&self.config))
    }

    /// The validated run configuration for `target`; `horizon` overrides the
    /// profile's default.
    pub fn prediction_config(
        &self,
        target: PredictionTarget,
        horizon: Option<usize>,
    ) -> Result<PredictionConfig> {
        let profile = self.profile(target);
        PredictionConfig::new(
            target,
            profile.models,
            horizon.unwrap_or(profile.horizon),
            profile.confidence_level,
            profile.auto_tune,
        )
    }

    /// Run the full pipeline for any target under the configured timeout.
    pub async fn predict(
        &self,
        target: PredictionTarget,
        frame: &TimeSeriesFrame,
        ctx: &FeatureContext,
        horizon: Option<usize>,
    ) -> Result<PredictionResult> {
        let config = self.prediction_config(target, horizon)?;
        let budget = Duration::from_secs(self.config.timeout_secs);
        let start = Instant::now();

        let outcome = match tokio::time::timeout(budget, self.pipeline.run(frame, ctx, &config)).await
        {
            Ok(result) => result,
            Err(_) => Err(AnalyticsError::Timeout(budget.as_millis() as u64)),
        };

        let mut metrics = self.metrics.lock().unwrap_or_else(|e| e.into_inner());
        match &outcome {
            Ok(result) => {
                metrics.record_run(
                    start.elapsed(),
                    result.excluded_models.keys().map(String::as_str),
                );
            }
            Err(e) => {
                metrics.record_failure();
                warn!(target_name = %target, error = %e, "prediction failed");
            }
        }
        outcome
    }

    pub async fn predict_demand(
        &self,
        frame: &TimeSeriesFrame,
        ctx: &FeatureContext,
        horizon: Option<usize>,
    ) -> Result<PredictionResult> {
        self.predict(PredictionTarget::Demand, frame, ctx, horizon).await
    }

    pub async fn predict_revenue(
        &self,
        frame: &TimeSeriesFrame,
        ctx: &FeatureContext,
        horizon: Option<usize>,
    ) -> Result<PredictionResult> {
        self.predict(PredictionTarget::Revenue, frame, ctx, horizon).await
    }

    /// Occupancy forecast, clamped to `[0, 1]` when the history is a ratio
    /// and to `[0, 100]` when it is a percentage.
    pub async fn predict_occupancy(
        &self,
        frame: &TimeSeriesFrame,
        ctx: &FeatureContext,
        horizon: Option<usize>,
    ) -> Result<PredictionResult> {
        let mut result = self
            .predict(PredictionTarget::Occupancy, frame, ctx, horizon)
            .await?;
        let ceiling = occupancy_ceiling(frame.values());
        let clamp = |v: &mut f64| *v = v.clamp(0.0, ceiling);
        result.predictions.iter_mut().for_each(clamp);
        result.confidence_interval.lower.iter_mut().for_each(clamp);
        result.confidence_interval.upper.iter_mut().for_each(clamp);
        Ok(result)
    }

    /// Optimize every product's price. One invalid product fails the call.
    pub fn optimize_pricing(&self, products: &[ProductPricing]) -> Result<Vec<PricingRecommendation>> {
        if products.is_empty() {
            return Err(AnalyticsError::Validation("no products to price".into()));
        }
        let start = Instant::now();
        let out = products
            .iter()
            .map(optimize_product)
            .collect::<Result<Vec<_>>>()?;
        info!(
            products = out.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "pricing optimized"
        );
        Ok(out)
    }

    /// Anomalies in an observed series (no sudden-change pass).
    pub fn detect_anomalies(&self, frame: &TimeSeriesFrame) -> Vec<AnomalyRecord> {
        self.detector
            .detect(frame.values(), Some(frame.dates()), SeriesKind::Historical)
    }

    pub fn metrics(&self) -> PipelineMetrics {
        self.metrics.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn store(&self) -> &SharedModelStore {
        &self.store
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }
}

fn occupancy_ceiling(history: &[f64]) -> f64 {
    if history.iter().all(|&v| v <= 1.0) {
        1.0
    } else {
        100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn frame(values: Vec<f64>) -> TimeSeriesFrame {
        TimeSeriesFrame::daily(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), values).unwrap()
    }

    fn profile(target: PredictionTarget, models: &[&str]) -> CompiledForecastProfile {
        CompiledForecastProfile {
            id: format!("{target}-profile"),
            target,
            models: models.iter().map(|m| m.to_string()).collect(),
            horizon: Some(10),
            confidence_level: None,
            auto_tune: None,
        }
    }

    #[test]
    fn profiles_override_defaults() {
        let facade = PredictiveAnalytics::new(ForecastConfig::default())
            .with_profiles(&[profile(PredictionTarget::Revenue, &["holt_winters", "ar"])])
            .unwrap();
        let revenue = facade.profile(PredictionTarget::Revenue);
        assert_eq!(revenue.horizon, 10);
        assert_eq!(revenue.confidence_level, 0.95);
        assert_eq!(
            revenue.models,
            [ModelKind::Autoregressive, ModelKind::HoltWinters]
                .into_iter()
                .collect::<BTreeSet<_>>()
        );
        assert_eq!(facade.profile(PredictionTarget::Demand).models.len(), ModelKind::ALL.len());
    }

    #[test]
    fn unknown_model_in_profile_is_rejected() {
        let err = PredictiveAnalytics::new(ForecastConfig::default())
            .with_profiles(&[profile(PredictionTarget::Demand, &["prophet"])])
            .err()
            .unwrap();
        assert!(matches!(err, AnalyticsError::UnknownCategory { .. }));
    }

    #[test]
    fn explicit_horizon_wins() {
        let facade = PredictiveAnalytics::new(ForecastConfig::default());
        let config = facade.prediction_config(PredictionTarget::Demand, Some(7)).unwrap();
        assert_eq!(config.horizon, 7);
        assert!(facade.prediction_config(PredictionTarget::Demand, Some(0)).is_err());
    }

    #[tokio::test]
    async fn occupancy_ratios_stay_in_unit_interval() {
        let values: Vec<f64> = (0..120)
            .map(|i| (0.6 + 0.003 * i as f64 + 0.05 * ((i % 7) as f64 / 7.0)).min(0.99))
            .collect();
        let facade = PredictiveAnalytics::new(ForecastConfig::default());
        let result = facade
            .predict_occupancy(&frame(values), &FeatureContext::default(), Some(14))
            .await
            .unwrap();
        let ci = &result.confidence_interval;
        for i in 0..14 {
            assert!(ci.lower[i] >= 0.0 && ci.upper[i] <= 1.0);
            assert!(ci.lower[i] <= result.predictions[i] && result.predictions[i] <= ci.upper[i]);
        }
    }

    #[tokio::test]
    async fn failures_are_counted() {
        let facade = PredictiveAnalytics::new(ForecastConfig::default());
        let err = facade
            .predict_revenue(&frame(vec![1.0; 5]), &FeatureContext::default(), Some(7))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::DataInsufficiency(_)));
        let m = facade.metrics();
        assert_eq!(m.runs_failed, 1);
        assert_eq!(m.runs_completed, 0);
    }

    #[tokio::test]
    async fn zero_budget_times_out() {
        let config = ForecastConfig {
            timeout_secs: 0,
            ..ForecastConfig::default()
        };
        let values: Vec<f64> = (0..200).map(|i| 50.0 + i as f64).collect();
        let facade = PredictiveAnalytics::new(config);
        let err = facade
            .predict_demand(&frame(values), &FeatureContext::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err, AnalyticsError::Timeout(0));
    }

    #[test]
    fn pricing_batch_fails_as_a_whole() {
        let facade = PredictiveAnalytics::new(ForecastConfig::default());
        let ok = ProductPricing::new("cusco-city-tour", 80.0, -1.2);
        let bad = ProductPricing::new("broken", -5.0, -1.2);
        assert_eq!(facade.optimize_pricing(&[ok.clone()]).unwrap().len(), 1);
        assert!(facade.optimize_pricing(&[ok, bad]).is_err());
        assert!(facade.optimize_pricing(&[]).is_err());
    }

    #[test]
    fn occupancy_ceiling_detects_scale() {
        assert_eq!(occupancy_ceiling(&[0.2, 0.9]), 1.0);
        assert_eq!(occupancy_ceiling(&[20.0, 90.0]), 100.0);
    }
}
