//! Gradient-boosted regression trees on step increments.
//!
//! Each tree fits the residual of the running prediction under squared loss.
//! Targets are day-over-day deltas and training rows are the engineered
//! feature frame (see [`Design`]). The multi-step forecast is recursive:
//! project the calendar onto the next date, predict one delta, advance the
//! [`LagWindow`] with the new level, repeat.

use spirit_core::{AnalyticsError, Result};

use super::design::Design;
use super::lag_window::{self, LagWindow};
use super::{ensure_history, ForecastModel, History, HyperParams, ModelForecast, ModelKind};
use crate::algorithms::regression_tree::{RegressionTree, SplitSearch, TreeParams};

/// Split-search flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boosting {
    Exact,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct BoostedTrees {
    flavour: Boosting,
    n_estimators: usize,
    learning_rate: f64,
    max_depth: usize,
    min_samples_leaf: usize,
    max_bins: usize,
}

impl BoostedTrees {
    pub fn new(flavour: Boosting, params: &HyperParams) -> Self {
        Self {
            flavour,
            n_estimators: params.usize_or("n_estimators", 60).max(1),
            learning_rate: params.get_or("learning_rate", 0.1).clamp(1e-4, 1.0),
            max_depth: params.usize_or("max_depth", 3).max(1),
            min_samples_leaf: params.usize_or("min_samples_leaf", 5).max(1),
            max_bins: params.usize_or("max_bins", 32).max(2),
        }
    }
}

struct Ensemble {
    base: f64,
    trees: Vec<RegressionTree>,
    learning_rate: f64,
}

impl Ensemble {
    fn predict(&self, row: &[f64]) -> f64 {
        self.base
            + self
                .trees
                .iter()
                .map(|t| self.learning_rate * t.predict(row))
                .sum::<f64>()
    }
}

impl ForecastModel for BoostedTrees {
    fn kind(&self) -> ModelKind {
        match self.flavour {
            Boosting::Exact => ModelKind::GradientBoosting,
            Boosting::Histogram => ModelKind::HistogramBoosting,
        }
    }

    fn min_history(&self) -> usize {
        lag_window::WARMUP + 2 * self.min_samples_leaf
    }

    fn fit_forecast(&self, history: History<'_>, horizon: usize) -> Result<ModelForecast> {
        ensure_history(self, &history)?;
        let design = Design::build(&history)?;
        let (rows, targets) = (&design.rows, &design.targets);
        if rows.is_empty() {
            return Err(AnalyticsError::DataInsufficiency(format!(
                "{} has no complete training rows",
                self.kind()
            )));
        }

        let search = match self.flavour {
            Boosting::Exact => SplitSearch::Exact,
            Boosting::Histogram => SplitSearch::histogram(rows, self.max_bins),
        };
        let params = TreeParams {
            max_depth: self.max_depth,
            min_samples_leaf: self.min_samples_leaf,
        };

        let base = targets.iter().sum::<f64>() / targets.len() as f64;
        let mut fitted = vec![base; targets.len()];
        let mut gains = vec![0.0; design.names.len()];
        let indices: Vec<usize> = (0..rows.len()).collect();
        let mut trees = Vec::with_capacity(self.n_estimators);

        for _ in 0..self.n_estimators {
            let residuals: Vec<f64> = targets.iter().zip(&fitted).map(|(y, f)| y - f).collect();
            let tree = RegressionTree::fit(rows, &residuals, &indices, &params, &search, &mut gains);
            for (f, row) in fitted.iter_mut().zip(rows) {
                *f += self.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        let model = Ensemble {
            base,
            trees,
            learning_rate: self.learning_rate,
        };

        let last_date = history.last_date().ok_or_else(|| {
            AnalyticsError::DataInsufficiency("empty history".into())
        })?;
        let mut window = LagWindow::from_history(history.values, last_date).ok_or_else(|| {
            AnalyticsError::DataInsufficiency(format!("{} warm-up not satisfied", self.kind()))
        })?;

        let mut predictions = Vec::with_capacity(horizon);
        for step in 0..horizon {
            let row = design.forecast_row(&window, history.len() + step, &history);
            let next = window.last_value() + model.predict(&row);
            if !next.is_finite() {
                return Err(AnalyticsError::ModelTraining(format!(
                    "{} produced a non-finite step",
                    self.kind()
                )));
            }
            predictions.push(next);
            window = window.advance(next);
        }

        let feature_gains = design.names.into_iter().zip(gains).collect();

        Ok(ModelForecast {
            predictions,
            feature_gains: Some(feature_gains),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::pipeline::features::FeatureContext;

    fn series(n: usize) -> (Vec<NaiveDate>, Vec<f64>) {
        let dates = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .iter_days()
            .take(n)
            .collect();
        let values = (0..n)
            .map(|i| 200.0 + 0.5 * i as f64 + ((i * 37) % 11) as f64 * 0.2)
            .collect();
        (dates, values)
    }

    #[test]
    fn exact_and_histogram_forecast_upward() {
        let (dates, values) = series(200);
        for flavour in [Boosting::Exact, Boosting::Histogram] {
            let model = BoostedTrees::new(flavour, &HyperParams::default());
            let out = model
                .fit_forecast(History::new(&dates, &values), 30)
                .unwrap();
            assert_eq!(out.predictions.len(), 30);
            assert!(
                out.predictions[29] > values[199],
                "{:?}: {} <= {}",
                flavour,
                out.predictions[29],
                values[199]
            );
            let gains = out.feature_gains.unwrap();
            assert!(gains.iter().any(|(name, _)| name == "rolling_mean_7"));
            assert!(gains.iter().any(|(name, _)| name == "day_of_week"));
            assert!(gains.iter().all(|(_, g)| *g >= 0.0));
        }
    }

    fn spiky(n: usize) -> (Vec<NaiveDate>, Vec<f64>) {
        let dates: Vec<NaiveDate> = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .iter_days()
            .take(n)
            .collect();
        let values = (0..n)
            .map(|i| 100.0 + 0.2 * i as f64 + if i % 10 == 0 { 80.0 } else { 0.0 })
            .collect();
        (dates, values)
    }

    #[test]
    fn holidays_shape_the_forecast() {
        let (dates, values) = spiky(200);
        // Every 10th day, including the ones inside the horizon.
        let holidays = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .iter_days()
            .take(230)
            .step_by(10);
        let ctx = FeatureContext::default().with_holidays(holidays);

        for flavour in [Boosting::Exact, Boosting::Histogram] {
            let model = BoostedTrees::new(flavour, &HyperParams::default());
            let plain = model
                .fit_forecast(History::new(&dates, &values), 30)
                .unwrap();
            let aware = model
                .fit_forecast(History::new(&dates, &values).with_context(&ctx), 30)
                .unwrap();
            assert_ne!(plain.predictions, aware.predictions, "{flavour:?}");

            let gains = aware.feature_gains.unwrap();
            let holiday_gain = gains
                .iter()
                .find(|(name, _)| name == "is_holiday")
                .map(|(_, g)| *g)
                .unwrap();
            assert!(holiday_gain > 0.0, "{flavour:?}");
        }

        // Day 200 is a holiday: the exact model should jump onto it.
        let model = BoostedTrees::new(Boosting::Exact, &HyperParams::default());
        let aware = model
            .fit_forecast(History::new(&dates, &values).with_context(&ctx), 30)
            .unwrap();
        assert!(
            aware.predictions[0] - values[199] > 40.0,
            "{} vs {}",
            aware.predictions[0],
            values[199]
        );
    }

    #[test]
    fn kind_follows_flavour() {
        let p = HyperParams::default();
        assert_eq!(BoostedTrees::new(Boosting::Exact, &p).kind(), ModelKind::GradientBoosting);
        assert_eq!(
            BoostedTrees::new(Boosting::Histogram, &p).kind(),
            ModelKind::HistogramBoosting
        );
    }
}
