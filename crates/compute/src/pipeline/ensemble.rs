//! Ensemble runner: fit every configured model independently, score each on
//! a chronological hold-out, then refit on the full history and forecast.
//!
//! Models run in parallel on the rayon pool. A model that errors or produces
//! non-finite output is excluded and logged; the run only fails when no model
//! survives.

use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use spirit_core::{AnalyticsError, Result};

use crate::models::{History, HyperParams, ModelForecast, ModelKind, ModelPerformance};
use crate::pipeline::features::FeatureContext;
use crate::store::{SharedModelStore, StoreKey, StoredModel};
use crate::types::PredictionConfig;

/// Share of the history used for training in the hold-out split.
const TRAIN_FRACTION: f64 = 0.8;

/// Shortest series the runner accepts at all.
pub const MIN_SERIES_LEN: usize = 20;

/// Rolling-origin folds used when auto-tuning.
const CV_FOLDS: usize = 3;

/// One surviving model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRun {
    pub kind: ModelKind,
    pub params: HyperParams,
    /// Forecast from the model refit on the full history.
    pub predictions: Vec<f64>,
    /// Accuracy on the hold-out split.
    pub performance: ModelPerformance,
    pub feature_gains: Option<Vec<(String, f64)>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleOutput {
    pub runs: Vec<ModelRun>,
    pub excluded: Vec<(ModelKind, String)>,
}

#[derive(Debug, Clone)]
pub struct EnsembleRunner {
    store: SharedModelStore,
}

impl EnsembleRunner {
    pub fn new(store: SharedModelStore) -> Self {
        Self { store }
    }

    /// Run every model in `config.model_set` on `history`. Blocking; call
    /// from a blocking context or use [`EnsembleRunner::run_blocking_task`].
    pub fn run(&self, history: History<'_>, config: &PredictionConfig) -> Result<EnsembleOutput> {
        config.validate()?;
        if history.len() < MIN_SERIES_LEN {
            return Err(AnalyticsError::DataInsufficiency(format!(
                "ensemble needs at least {MIN_SERIES_LEN} observations, got {}",
                history.len()
            )));
        }

        let start = Instant::now();
        let key = StoreKey::for_config(config);
        let kinds: Vec<ModelKind> = config.model_set.iter().copied().collect();

        let outcomes: Vec<(ModelKind, Result<ModelRun>)> = kinds
            .par_iter()
            .map(|&kind| (kind, self.run_model(kind, history, config, &key)))
            .collect();

        let mut runs = Vec::new();
        let mut excluded = Vec::new();
        let mut all_insufficient = true;
        for (kind, outcome) in outcomes {
            match outcome {
                Ok(run) => {
                    debug!(model = %kind, rmse = run.performance.rmse, "model completed");
                    runs.push(run);
                }
                Err(e) => {
                    warn!(model = %kind, error = %e, "model excluded from ensemble");
                    all_insufficient &= matches!(e, AnalyticsError::DataInsufficiency(_));
                    excluded.push((kind, e.to_string()));
                }
            }
        }

        if runs.is_empty() {
            let reasons: Vec<String> = excluded.iter().map(|(k, e)| format!("{k}: {e}")).collect();
            let detail = reasons.join("; ");
            return Err(if all_insufficient {
                AnalyticsError::DataInsufficiency(detail)
            } else {
                AnalyticsError::ModelTraining(detail)
            });
        }

        info!(
            target_name = %config.target,
            survivors = runs.len(),
            excluded = excluded.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "ensemble run complete"
        );
        Ok(EnsembleOutput { runs, excluded })
    }

    /// Run the ensemble on tokio's blocking pool with owned inputs.
    pub async fn run_blocking_task(
        &self,
        dates: Vec<chrono::NaiveDate>,
        values: Vec<f64>,
        context: FeatureContext,
        config: PredictionConfig,
    ) -> Result<EnsembleOutput> {
        let runner = self.clone();
        tokio::task::spawn_blocking(move || {
            runner.run(History::new(&dates, &values).with_context(&context), &config)
        })
            .await
            .map_err(|e| AnalyticsError::ModelTraining(format!("ensemble task failed: {e}")))?
    }

    fn run_model(
        &self,
        kind: ModelKind,
        history: History<'_>,
        config: &PredictionConfig,
        key: &StoreKey,
    ) -> Result<ModelRun> {
        let split = ((history.len() as f64) * TRAIN_FRACTION).floor() as usize;
        let train = history.head(split);
        let test = &history.values[split..];

        let params = if config.auto_tune {
            self.tuned_params(kind, train, config.horizon, key)
        } else {
            HyperParams::default()
        };
        let model = kind.build(&params);

        let validation = model.fit_forecast(train, test.len())?;
        check_forecast(kind, &validation, test.len())?;
        let performance = ModelPerformance::evaluate(test, &validation.predictions);
        if !performance.is_finite() {
            return Err(AnalyticsError::ModelTraining(format!(
                "{kind}: non-finite hold-out metrics"
            )));
        }

        let full = model.fit_forecast(history, config.horizon)?;
        check_forecast(kind, &full, config.horizon)?;

        Ok(ModelRun {
            kind,
            params,
            predictions: full.predictions,
            performance,
            feature_gains: full.feature_gains,
        })
    }

    /// Grid search by rolling-origin cross-validation on the training split.
    /// Results are cached in the model store under `key`.
    fn tuned_params(
        &self,
        kind: ModelKind,
        train: History<'_>,
        horizon: usize,
        key: &StoreKey,
    ) -> HyperParams {
        if let Some(stored) = self.store.get(key, kind) {
            debug!(model = %kind, params = %stored.params, "reusing tuned parameters");
            return stored.params;
        }

        let fold = horizon.min(train.len() / (CV_FOLDS + 1)).max(1);
        let mut best: Option<(HyperParams, f64)> = None;

        for params in kind.search_grid() {
            let model = kind.build(&params);
            let mut scores = Vec::new();
            for k in 0..CV_FOLDS {
                let Some(cut) = train.len().checked_sub((CV_FOLDS - k) * fold) else {
                    continue;
                };
                if cut < model.min_history() {
                    continue;
                }
                let actual = &train.values[cut..cut + fold];
                if let Ok(f) = model.fit_forecast(train.head(cut), fold) {
                    let perf = ModelPerformance::evaluate(actual, &f.predictions);
                    if perf.is_finite() {
                        scores.push(perf.rmse);
                    }
                }
            }
            if scores.is_empty() {
                continue;
            }
            let score = scores.iter().sum::<f64>() / scores.len() as f64;
            if best.as_ref().map(|(_, s)| score < *s).unwrap_or(true) {
                best = Some((params, score));
            }
        }

        match best {
            Some((params, cv_rmse)) => {
                self.store.put(
                    key.clone(),
                    kind,
                    StoredModel {
                        params: params.clone(),
                        cv_rmse,
                        tuned_at: Utc::now(),
                    },
                );
                params
            }
            None => {
                debug!(model = %kind, "no tunable folds; using defaults");
                HyperParams::default()
            }
        }
    }
}

fn check_forecast(kind: ModelKind, forecast: &ModelForecast, expected: usize) -> Result<()> {
    if forecast.predictions.len() != expected {
        return Err(AnalyticsError::ModelTraining(format!(
            "{kind}: expected {expected} predictions, got {}",
            forecast.predictions.len()
        )));
    }
    if forecast.predictions.iter().any(|v| !v.is_finite()) {
        return Err(AnalyticsError::ModelTraining(format!(
            "{kind}: non-finite prediction"
        )));
    }
    Ok(())
}
