//! Forecast pipeline orchestrator.
//!
//! Wires the stages of one prediction together:
//!
//! 1. **Features**: calendar/lag/rolling/seasonal columns (`features`).
//! 2. **Ensemble**: every configured model, in parallel (`ensemble`).
//! 3. **Aggregate**: inverse-RMSE blend and confidence band (`aggregate`).
//! 4. **Anomalies**: z-score, isolation forest, sudden change (`anomaly`).
//! 5. **Recommend**: trend, peak, risk and season messages (`insights`).
//!
//! Stage 2 is the only slow step and runs on the blocking pool; stage 3
//! waits for every surviving model before blending.

pub mod aggregate;
pub mod anomaly;
pub mod ensemble;
pub mod features;
pub mod insights;
pub mod metrics;

use std::time::Instant;

use chrono::{Duration, NaiveDate};
use indexmap::IndexMap;
use tracing::{debug, info};

use spirit_core::{AnalyticsError, Result, TimeSeriesFrame};

use crate::store::SharedModelStore;
use crate::types::{PredictionConfig, PredictionResult};

use self::anomaly::{AnomalyDetector, SeriesKind};
use self::ensemble::{EnsembleRunner, MIN_SERIES_LEN};
use self::features::{FeatureContext, FeatureEngineer};
use self::insights::{InsightContext, InsightRecommender};

/// Stateless forecast pipeline. The only state it touches is the shared
/// model store handed to the ensemble runner.
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    engineer: FeatureEngineer,
    runner: EnsembleRunner,
    detector: AnomalyDetector,
    recommender: InsightRecommender,
}

impl ForecastPipeline {
    pub fn new(store: SharedModelStore, detector: AnomalyDetector) -> Self {
        Self {
            engineer: FeatureEngineer::new(),
            runner: EnsembleRunner::new(store),
            detector,
            recommender: InsightRecommender::new(),
        }
    }

    /// Run all stages and assemble a [`PredictionResult`].
    ///
    /// Any stage error aborts the run; nothing partial is returned.
    pub async fn run(
        &self,
        frame: &TimeSeriesFrame,
        ctx: &FeatureContext,
        config: &PredictionConfig,
    ) -> Result<PredictionResult> {
        config.validate()?;
        if frame.len() < MIN_SERIES_LEN {
            return Err(AnalyticsError::DataInsufficiency(format!(
                "{} forecast needs at least {MIN_SERIES_LEN} observations, got {}",
                config.target,
                frame.len()
            )));
        }
        let last_date = frame
            .last_date()
            .ok_or_else(|| AnalyticsError::DataInsufficiency("empty series".into()))?;
        let start = Instant::now();

        // Stage 1: features.
        let engineered = self.engineer.engineer(frame, ctx);

        // Stage 2: ensemble (blocking pool, joined here).
        let ensemble = self
            .runner
            .run_blocking_task(
                frame.dates().to_vec(),
                frame.values().to_vec(),
                ctx.clone(),
                config.clone(),
            )
            .await?;

        // Stage 3: aggregate.
        let agg = aggregate::aggregate(&ensemble.runs, config.confidence_level)?;
        let forecast_dates = forecast_dates(last_date, config.horizon);

        // Stage 4: anomalies on the blended forecast.
        let anomalies =
            self.detector
                .detect(&agg.predictions, Some(&forecast_dates), SeriesKind::Forecast);

        // Stage 5: recommendations.
        let recommendations = self.recommender.recommend(
            &agg.predictions,
            &anomalies,
            &InsightContext {
                target: config.target,
                forecast_dates: &forecast_dates,
                history: Some(frame.values()),
            },
        );

        let feature_importance =
            aggregate::feature_importance(&ensemble.runs, &agg.weights, &engineered);
        let baseline = aggregate::baseline_comparison(frame.values(), &agg.predictions);
        let model_performance: IndexMap<_, _> = ensemble
            .runs
            .iter()
            .map(|r| (r.kind.to_string(), r.performance.clone()))
            .collect();
        let excluded_models: IndexMap<_, _> = ensemble
            .excluded
            .iter()
            .map(|(k, e)| (k.to_string(), e.clone()))
            .collect();

        debug!(
            engineered_rows = engineered.len(),
            anomalies = anomalies.len(),
            "forecast stages complete"
        );
        info!(
            target_name = %config.target,
            horizon = config.horizon,
            models = model_performance.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "forecast pipeline finished"
        );

        Ok(PredictionResult {
            target: config.target,
            predictions: agg.predictions,
            confidence_interval: agg.interval,
            forecast_dates,
            feature_importance,
            model_performance,
            model_weights: agg.weights,
            anomalies,
            recommendations,
            baseline,
            excluded_models,
        })
    }
}

/// The `horizon` days following `last`.
pub fn forecast_dates(last: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as i64).map(|d| last + Duration::days(d)).collect()
}
