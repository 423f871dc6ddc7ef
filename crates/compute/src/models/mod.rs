//! Forecasting models run by the ensemble.
//!
//! Every model implements [`ForecastModel`]: fit on a history and return an
//! `horizon`-length forecast in one call. Models are cheap to construct and
//! hold only their hyperparameters, so the runner can build a fresh instance
//! per fit and run them on independent threads.

pub mod autoregressive;
pub mod boosting;
mod design;
pub mod holt_winters;
pub mod lag_window;
pub mod metrics;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use spirit_core::{AnalyticsError, Result};

use crate::pipeline::features::FeatureContext;

pub use autoregressive::Autoregressive;
pub use boosting::{BoostedTrees, Boosting};
pub use holt_winters::HoltWinters;
pub use lag_window::LagWindow;
pub use metrics::ModelPerformance;

/// Named forecasting models available to an ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Autoregressive model on first differences (sequence model).
    Autoregressive,
    /// Additive Holt-Winters with weekly seasonality (trend/season decomposer).
    HoltWinters,
    /// Gradient-boosted trees with exact split search.
    GradientBoosting,
    /// Gradient-boosted trees with histogram split search.
    HistogramBoosting,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Autoregressive,
        ModelKind::HoltWinters,
        ModelKind::GradientBoosting,
        ModelKind::HistogramBoosting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Autoregressive => "autoregressive",
            ModelKind::HoltWinters => "holt_winters",
            ModelKind::GradientBoosting => "gradient_boosting",
            ModelKind::HistogramBoosting => "histogram_boosting",
        }
    }

    /// Build an untrained model with the given hyperparameters.
    pub fn build(&self, params: &HyperParams) -> Box<dyn ForecastModel> {
        match self {
            ModelKind::Autoregressive => Box::new(Autoregressive::new(params)),
            ModelKind::HoltWinters => Box::new(HoltWinters::new(params)),
            ModelKind::GradientBoosting => Box::new(BoostedTrees::new(Boosting::Exact, params)),
            ModelKind::HistogramBoosting => {
                Box::new(BoostedTrees::new(Boosting::Histogram, params))
            }
        }
    }

    /// Hyperparameter grid searched when auto-tuning is enabled.
    pub fn search_grid(&self) -> Vec<HyperParams> {
        let grid: Vec<Vec<(&str, f64)>> = match self {
            ModelKind::Autoregressive => vec![
                vec![("order", 7.0), ("ridge", 0.1)],
                vec![("order", 7.0), ("ridge", 1.0)],
                vec![("order", 14.0), ("ridge", 0.1)],
                vec![("order", 14.0), ("ridge", 1.0)],
            ],
            ModelKind::HoltWinters => vec![
                vec![("alpha", 0.2), ("beta", 0.05), ("gamma", 0.1)],
                vec![("alpha", 0.5), ("beta", 0.05), ("gamma", 0.1)],
                vec![("alpha", 0.2), ("beta", 0.1), ("gamma", 0.3)],
                vec![("alpha", 0.5), ("beta", 0.1), ("gamma", 0.3)],
            ],
            ModelKind::GradientBoosting => vec![
                vec![("n_estimators", 50.0), ("learning_rate", 0.1), ("max_depth", 3.0)],
                vec![("n_estimators", 100.0), ("learning_rate", 0.05), ("max_depth", 3.0)],
                vec![("n_estimators", 50.0), ("learning_rate", 0.1), ("max_depth", 2.0)],
            ],
            ModelKind::HistogramBoosting => vec![
                vec![("max_bins", 16.0), ("learning_rate", 0.1)],
                vec![("max_bins", 32.0), ("learning_rate", 0.1)],
                vec![("max_bins", 32.0), ("learning_rate", 0.05)],
            ],
        };
        grid.into_iter().map(HyperParams::from_pairs).collect()
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "autoregressive" | "ar" | "sequence" => Ok(ModelKind::Autoregressive),
            "holt_winters" | "exponential_smoothing" => Ok(ModelKind::HoltWinters),
            "gradient_boosting" | "gbt" => Ok(ModelKind::GradientBoosting),
            "histogram_boosting" | "hist_gbt" => Ok(ModelKind::HistogramBoosting),
            other => Err(AnalyticsError::unknown("model", other)),
        }
    }
}

/// Named numeric hyperparameters. Ordered so hashing and display are stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HyperParams(BTreeMap<String, f64>);

impl HyperParams {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    pub fn get_or(&self, key: &str, default: f64) -> f64 {
        self.0.get(key).copied().filter(|v| v.is_finite()).unwrap_or(default)
    }

    pub fn usize_or(&self, key: &str, default: usize) -> usize {
        let v = self.get_or(key, default as f64);
        if v < 0.0 { default } else { v.round() as usize }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for HyperParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}={v}")).collect();
        f.write_str(&parts.join(","))
    }
}

static NO_CONTEXT: FeatureContext = FeatureContext {
    destination: None,
    holidays: BTreeSet::new(),
};

/// Read-only view of the history a model is fit on.
#[derive(Debug, Clone, Copy)]
pub struct History<'a> {
    pub dates: &'a [NaiveDate],
    pub values: &'a [f64],
    /// Holidays and destination used by models that engineer features.
    pub context: &'a FeatureContext,
}

impl<'a> History<'a> {
    pub fn new(dates: &'a [NaiveDate], values: &'a [f64]) -> Self {
        Self {
            dates,
            values,
            context: &NO_CONTEXT,
        }
    }

    pub fn with_context(self, context: &'a FeatureContext) -> Self {
        Self { context, ..self }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First `n` points.
    pub fn head(&self, n: usize) -> History<'a> {
        let n = n.min(self.len());
        History {
            dates: &self.dates[..n],
            values: &self.values[..n],
            context: self.context,
        }
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}

/// Output of a single fit-and-forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelForecast {
    pub predictions: Vec<f64>,
    /// Split gain per named feature, for models that learn feature splits.
    pub feature_gains: Option<Vec<(String, f64)>>,
}

impl ModelForecast {
    pub fn plain(predictions: Vec<f64>) -> Self {
        Self {
            predictions,
            feature_gains: None,
        }
    }
}

pub trait ForecastModel: Send + Sync {
    fn kind(&self) -> ModelKind;

    /// Minimum history length this model can be fit on.
    fn min_history(&self) -> usize;

    /// Fit on `history` and forecast the next `horizon` daily steps.
    fn fit_forecast(&self, history: History<'_>, horizon: usize) -> Result<ModelForecast>;
}

/// Shared precondition check for model implementations.
pub(crate) fn ensure_history(model: &dyn ForecastModel, history: &History<'_>) -> Result<()> {
    if history.len() < model.min_history() {
        return Err(AnalyticsError::DataInsufficiency(format!(
            "{} needs {} points, got {}",
            model.kind(),
            model.min_history(),
            history.len()
        )));
    }
    Ok(())
}
