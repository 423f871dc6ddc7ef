//! Feature engineering for daily series.
//!
//! Derives calendar, lag, rolling, exponentially weighted, trend and
//! (with a year of strictly positive data) multiplicative weekly seasonal
//! columns. The input frame is never modified: a new frame is returned with
//! the derived columns appended, and columns whose names already exist are
//! left alone so running the transform twice adds nothing.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};
use tracing::debug;

use spirit_core::TimeSeriesFrame;

use crate::algorithms::stats;

pub const LAGS: [usize; 4] = [1, 7, 14, 30];
pub const ROLLING_WINDOWS: [usize; 3] = [7, 14, 30];
pub const EWM_SPANS: [usize; 2] = [7, 30];

/// Columns that depend only on the date, so they can be projected over a
/// forecast horizon. Order matches [`calendar_row`].
pub const CALENDAR_COLUMNS: [&str; 7] = [
    "day_of_week",
    "day_of_month",
    "month",
    "quarter",
    "iso_week",
    "is_weekend",
    "is_holiday",
];

/// Minimum observations before seasonal decomposition is attempted.
pub const SEASONAL_MIN_OBSERVATIONS: usize = 365;
const SEASONAL_PERIOD: usize = 7;

/// Metadata that shapes feature derivation.
#[derive(Debug, Clone, Default)]
pub struct FeatureContext {
    /// Destination or product the series belongs to, for logging.
    pub destination: Option<String>,
    /// Dates flagged by the `is_holiday` column.
    pub holidays: BTreeSet<NaiveDate>,
}

impl FeatureContext {
    pub fn for_destination(destination: impl Into<String>) -> Self {
        Self {
            destination: Some(destination.into()),
            ..Default::default()
        }
    }

    pub fn with_holidays(mut self, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.holidays.extend(holidays);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureEngineer;

impl FeatureEngineer {
    pub fn new() -> Self {
        Self
    }

    /// Derive features and drop warm-up rows that still contain NaN.
    ///
    /// Never fails: with too little history the lag/rolling columns are all
    /// NaN and every row is dropped, and seasonal columns are simply omitted.
    pub fn engineer(&self, frame: &TimeSeriesFrame, ctx: &FeatureContext) -> TimeSeriesFrame {
        let values = frame.values();
        let dates = frame.dates();
        let mut derived: Vec<(String, Vec<f64>)> = Vec::new();
        let mut push = |name: String, build: &dyn Fn() -> Vec<f64>| {
            if !frame.has_column(&name) {
                derived.push((name, build()));
            }
        };

        // Calendar
        let calendar: Vec<[f64; CALENDAR_COLUMNS.len()]> =
            dates.iter().map(|d| calendar_row(*d, ctx)).collect();
        for (i, name) in CALENDAR_COLUMNS.iter().enumerate() {
            push((*name).into(), &|| calendar.iter().map(|row| row[i]).collect());
        }

        for lag in LAGS {
            push(format!("lag_{lag}"), &|| lagged(values, lag));
        }

        for window in ROLLING_WINDOWS {
            push(format!("rolling_mean_{window}"), &|| rolling(values, window, stats::mean));
            push(format!("rolling_std_{window}"), &|| {
                rolling(values, window, stats::sample_std_dev)
            });
            push(format!("rolling_max_{window}"), &|| {
                rolling(values, window, |w| w.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            });
            push(format!("rolling_min_{window}"), &|| {
                rolling(values, window, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
            });
        }

        for span in EWM_SPANS {
            push(format!("ewm_{span}"), &|| ewm(values, span));
        }

        push("trend".into(), &|| (0..values.len()).map(|i| i as f64).collect());
        push("trend_squared".into(), &|| {
            (0..values.len()).map(|i| (i * i) as f64).collect()
        });

        let seasonal_eligible =
            values.len() >= SEASONAL_MIN_OBSERVATIONS && values.iter().all(|v| *v > 0.0);
        if seasonal_eligible && !frame.has_column("seasonal") {
            let (trend, seasonal, residual) = decompose_multiplicative(values, SEASONAL_PERIOD);
            derived.push(("seasonal".into(), seasonal));
            derived.push(("seasonal_trend".into(), trend));
            derived.push(("seasonal_residual".into(), residual));
        }

        let added = derived.len();
        let out = frame.extend_columns(derived).drop_incomplete_rows();
        debug!(
            destination = ctx.destination.as_deref().unwrap_or("-"),
            rows_in = frame.len(),
            rows_out = out.len(),
            columns_added = added,
            seasonal = seasonal_eligible,
            "features engineered"
        );
        out
    }
}

/// Calendar features of `date`, aligned with [`CALENDAR_COLUMNS`].
pub fn calendar_row(date: NaiveDate, ctx: &FeatureContext) -> [f64; CALENDAR_COLUMNS.len()] {
    [
        date.weekday().num_days_from_monday() as f64,
        date.day() as f64,
        date.month() as f64,
        ((date.month() - 1) / 3 + 1) as f64,
        date.iso_week().week() as f64,
        flag(matches!(date.weekday(), Weekday::Sat | Weekday::Sun)),
        flag(ctx.holidays.contains(&date)),
    ]
}

/// Names of the history-dependent columns, in frame order: lags, rolling
/// statistics, EWMAs, trend indices.
pub fn state_columns() -> Vec<String> {
    let mut names: Vec<String> = LAGS.iter().map(|l| format!("lag_{l}")).collect();
    for w in ROLLING_WINDOWS {
        for stat in ["mean", "std", "max", "min"] {
            names.push(format!("rolling_{stat}_{w}"));
        }
    }
    names.extend(EWM_SPANS.iter().map(|s| format!("ewm_{s}")));
    names.push("trend".into());
    names.push("trend_squared".into());
    names
}

/// Whether a state column is measured in the series' own units (as opposed
/// to a spread or an index).
pub fn is_level_column(name: &str) -> bool {
    !(name.starts_with("rolling_std_") || name.starts_with("trend"))
}

fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

fn lagged(values: &[f64], lag: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| if i >= lag { values[i - lag] } else { f64::NAN })
        .collect()
}

/// Trailing window ending at each row (inclusive); NaN until full.
fn rolling(values: &[f64], window: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if i + 1 >= window {
                f(&values[i + 1 - window..=i])
            } else {
                f64::NAN
            }
        })
        .collect()
}

pub(crate) fn ewm_alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// Exponentially weighted mean with `alpha = 2 / (span + 1)`, seeded with the
/// first observation.
fn ewm(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = ewm_alpha(span);
    let mut out = Vec::with_capacity(values.len());
    let mut acc = None;
    for &v in values {
        let next = match acc {
            None => v,
            Some(prev) => alpha * v + (1.0 - alpha) * prev,
        };
        acc = Some(next);
        out.push(next);
    }
    out
}

/// Classical multiplicative decomposition: centred moving-average trend,
/// per-phase mean ratio as the seasonal index (normalized to mean 1), and
/// the remaining ratio as residual. Trend edges are padded with the nearest
/// centred value so no rows are lost.
pub fn decompose_multiplicative(values: &[f64], period: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let n = values.len();
    let half = period / 2;
    let mut trend = vec![f64::NAN; n];
    if n >= period {
        for (i, slot) in trend.iter_mut().enumerate().take(n - half).skip(half) {
            *slot = if period % 2 == 1 {
                stats::mean(&values[i - half..=i + half])
            } else {
                // 2xMA for even periods.
                let a = stats::mean(&values[i - half..i + half]);
                let b = stats::mean(&values[i + 1 - half..=i + half]);
                (a + b) / 2.0
            };
        }
        let first = trend[half];
        let last = trend[n - half - 1];
        trend[..half].iter_mut().for_each(|t| *t = first);
        trend[n - half..].iter_mut().for_each(|t| *t = last);
    }

    let mut phase_sum = vec![0.0; period];
    let mut phase_n = vec![0usize; period];
    for i in 0..n {
        if trend[i].is_finite() && trend[i] > 0.0 {
            phase_sum[i % period] += values[i] / trend[i];
            phase_n[i % period] += 1;
        }
    }
    let mut index: Vec<f64> = phase_sum
        .iter()
        .zip(&phase_n)
        .map(|(s, &c)| if c > 0 { s / c as f64 } else { 1.0 })
        .collect();
    let norm = stats::mean(&index);
    if norm > 0.0 {
        index.iter_mut().for_each(|v| *v /= norm);
    }

    let seasonal: Vec<f64> = (0..n).map(|i| index[i % period]).collect();
    let residual: Vec<f64> = (0..n)
        .map(|i| values[i] / (trend[i] * seasonal[i]))
        .collect();
    (trend, seasonal, residual)
}
