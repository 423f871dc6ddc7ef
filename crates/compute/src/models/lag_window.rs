//! Immutable history window for recursive multi-step forecasting.
//!
//! A [`LagWindow`] holds the most recent observations, the running EWMA
//! levels and the date of the next step. [`LagWindow::advance`] returns a
//! new window with the predicted value appended; the original is untouched,
//! so the row used to make a prediction can never alias the row that
//! receives it.
//!
//! [`LagWindow::state`] reproduces the history-dependent columns of the
//! feature engineer (lags, rolling statistics, EWMAs, trend) for the last
//! observed step, so rows built while forecasting line up with the rows the
//! model was trained on.

use std::collections::VecDeque;

use chrono::{Duration, NaiveDate};

use crate::algorithms::stats;
use crate::pipeline::features::{ewm_alpha, is_level_column, EWM_SPANS, LAGS, ROLLING_WINDOWS};

/// Observations needed before the first state row is complete.
pub const WARMUP: usize = 31;

#[derive(Debug, Clone, PartialEq)]
pub struct LagWindow {
    recent: VecDeque<f64>,
    ewm: [f64; EWM_SPANS.len()],
    /// Observations seen so far, including those no longer in `recent`.
    observed: usize,
    next_date: NaiveDate,
}

impl LagWindow {
    /// Window over `values`, predicting the day after `last_date`.
    ///
    /// Returns `None` when fewer than [`WARMUP`] values are available.
    pub fn from_history(values: &[f64], last_date: NaiveDate) -> Option<Self> {
        if values.len() < WARMUP {
            return None;
        }
        let mut ewm = [0.0; EWM_SPANS.len()];
        for (slot, span) in ewm.iter_mut().zip(EWM_SPANS) {
            let alpha = ewm_alpha(span);
            *slot = values[1..]
                .iter()
                .fold(values[0], |acc, v| alpha * v + (1.0 - alpha) * acc);
        }
        Some(Self {
            recent: values[values.len() - WARMUP..].iter().copied().collect(),
            ewm,
            observed: values.len(),
            next_date: last_date + Duration::days(1),
        })
    }

    pub fn next_date(&self) -> NaiveDate {
        self.next_date
    }

    pub fn last_value(&self) -> f64 {
        self.recent.back().copied().unwrap_or(0.0)
    }

    /// State columns for the last observation, in
    /// [`state_columns`](crate::pipeline::features::state_columns) order.
    /// Level columns are expressed as differences to the last value.
    pub fn state(&self) -> Vec<f64> {
        let n = self.recent.len();
        let last = self.last_value();
        let (head, tail) = self.recent.as_slices();
        let recent: Vec<f64> = head.iter().chain(tail).copied().collect();

        let mut row: Vec<f64> = LAGS.iter().map(|&k| recent[n - 1 - k]).collect();
        for w in ROLLING_WINDOWS {
            let slice = &recent[n - w..];
            row.push(stats::mean(slice));
            row.push(stats::sample_std_dev(slice));
            row.push(slice.iter().copied().fold(f64::NEG_INFINITY, f64::max));
            row.push(slice.iter().copied().fold(f64::INFINITY, f64::min));
        }
        row.extend(self.ewm);
        let t = (self.observed - 1) as f64;
        row.push(t);
        row.push(t * t);

        for (v, name) in row.iter_mut().zip(crate::pipeline::features::state_columns()) {
            if is_level_column(&name) {
                *v -= last;
            }
        }
        row
    }

    /// A new window with `value` observed at `next_date`.
    pub fn advance(&self, value: f64) -> Self {
        let mut recent = self.recent.clone();
        recent.push_back(value);
        while recent.len() > WARMUP {
            recent.pop_front();
        }
        let mut ewm = self.ewm;
        for (slot, span) in ewm.iter_mut().zip(EWM_SPANS) {
            let alpha = ewm_alpha(span);
            *slot = alpha * value + (1.0 - alpha) * *slot;
        }
        Self {
            recent,
            ewm,
            observed: self.observed + 1,
            next_date: self.next_date + Duration::days(1),
        }
    }
}
