use std::collections::VecDeque;

use spirit_core::{AnalyticsError, Result};

use super::{ensure_history, ForecastModel, History, HyperParams, ModelForecast, ModelKind};
use crate::algorithms::linear::ridge_fit;

const DEFAULT_ORDER: usize = 7;
const DEFAULT_RIDGE: f64 = 0.1;

/// AR(p) on first differences with a drift term, integrated back to levels.
///
/// Differencing keeps a linear trend as a constant drift, which the
/// intercept absorbs, so forecasts continue the trend instead of decaying
/// towards the historical mean.
#[derive(Debug, Clone)]
pub struct Autoregressive {
    order: usize,
    ridge: f64,
}

impl Autoregressive {
    pub fn new(params: &HyperParams) -> Self {
        Self {
            order: params.usize_or("order", DEFAULT_ORDER).max(1),
            ridge: params.get_or("ridge", DEFAULT_RIDGE).max(0.0),
        }
    }
}

impl ForecastModel for Autoregressive {
    fn kind(&self) -> ModelKind {
        ModelKind::Autoregressive
    }

    fn min_history(&self) -> usize {
        3 * self.order + 2
    }

    fn fit_forecast(&self, history: History<'_>, horizon: usize) -> Result<ModelForecast> {
        ensure_history(self, &history)?;
        let p = self.order;
        let diffs: Vec<f64> = history.values.windows(2).map(|w| w[1] - w[0]).collect();

        let mut rows = Vec::with_capacity(diffs.len() - p);
        let mut targets = Vec::with_capacity(diffs.len() - p);
        for t in p..diffs.len() {
            let mut row = Vec::with_capacity(p + 1);
            row.push(1.0);
            row.extend((1..=p).map(|k| diffs[t - k]));
            rows.push(row);
            targets.push(diffs[t]);
        }

        let coef = ridge_fit(&rows, &targets, self.ridge, true).ok_or_else(|| {
            AnalyticsError::ModelTraining(format!("autoregressive order {p}: singular system"))
        })?;

        // Newest difference at the back.
        let mut recent: VecDeque<f64> = diffs[diffs.len() - p..].iter().copied().collect();
        let mut level = history.values[history.len() - 1];
        let mut predictions = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let next_diff = coef[0]
                + (1..=p)
                    .map(|k| coef[k] * recent[recent.len() - k])
                    .sum::<f64>();
            level += next_diff;
            predictions.push(level);
            recent.pop_front();
            recent.push_back(next_diff);
        }

        if predictions.iter().any(|v| !v.is_finite()) {
            return Err(AnalyticsError::ModelTraining(
                "autoregressive forecast diverged".into(),
            ));
        }
        Ok(ModelForecast::plain(predictions))
    }
}
