//! Training and forecast rows for the tree models.
//!
//! Training rows come straight from [`FeatureEngineer`] output. A sample for
//! step `p` pairs the calendar columns (and weekly `seasonal` index, when
//! present) of day `p` with the history-dependent columns of day `p - 1`,
//! and its target is the increment `y[p] - y[p - 1]`. Level columns are
//! taken relative to `y[p - 1]` so the trees learn shapes rather than
//! absolute heights.
//!
//! Forecast rows project the calendar onto the horizon with
//! [`calendar_row`] and take the history-dependent part from a
//! [`LagWindow`], which reproduces the same columns step by step.
//! `seasonal_trend` and `seasonal_residual` come from a centred moving
//! average and are left out: they would read future values.

use spirit_core::{AnalyticsError, Result, TimeSeriesFrame};

use super::lag_window::LagWindow;
use super::History;
use crate::pipeline::features::{
    calendar_row, is_level_column, state_columns, FeatureEngineer, CALENDAR_COLUMNS,
};

const SEASONAL_COLUMN: &str = "seasonal";
const SEASONAL_PERIOD: usize = 7;

#[derive(Debug, Clone)]
pub(crate) struct Design {
    pub names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
    /// Seasonal index by position modulo the period.
    seasonal: Option<[f64; SEASONAL_PERIOD]>,
}

impl Design {
    pub fn build(history: &History<'_>) -> Result<Self> {
        let frame = TimeSeriesFrame::new(history.dates.to_vec(), history.values.to_vec())?;
        let engineered = FeatureEngineer::new().engineer(&frame, history.context);
        let state = state_columns();
        let state_data = state
            .iter()
            .map(|name| column(&engineered, name))
            .collect::<Result<Vec<_>>>()?;
        let calendar_data = CALENDAR_COLUMNS
            .iter()
            .map(|name| column(&engineered, name))
            .collect::<Result<Vec<_>>>()?;
        let seasonal_data = engineered.column(SEASONAL_COLUMN);
        let relative: Vec<bool> = state.iter().map(|n| is_level_column(n)).collect();

        // Position of each engineered row in the original history.
        let positions: Vec<usize> = engineered
            .dates()
            .iter()
            .filter_map(|d| history.dates.binary_search(d).ok())
            .collect();

        let mut names: Vec<String> = CALENDAR_COLUMNS.iter().map(|c| c.to_string()).collect();
        if seasonal_data.is_some() {
            names.push(SEASONAL_COLUMN.into());
        }
        names.extend(state);

        let mut seasonal = seasonal_data.map(|_| [1.0; SEASONAL_PERIOD]);
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for r in 1..positions.len() {
            let (prev, p) = (positions[r - 1], positions[r]);
            if let (Some(profile), Some(col)) = (seasonal.as_mut(), seasonal_data) {
                profile[p % SEASONAL_PERIOD] = col[r];
            }
            if prev + 1 != p {
                continue;
            }
            let last = history.values[prev];
            let mut row: Vec<f64> = calendar_data.iter().map(|col| col[r]).collect();
            if let Some(col) = seasonal_data {
                row.push(col[r]);
            }
            row.extend(
                state_data
                    .iter()
                    .zip(&relative)
                    .map(|(col, &rel)| if rel { col[r - 1] - last } else { col[r - 1] }),
            );
            rows.push(row);
            targets.push(history.values[p] - last);
        }

        Ok(Self {
            names,
            rows,
            targets,
            seasonal,
        })
    }

    /// Row for the step `window` is about to predict, at absolute
    /// `position` in the extended series.
    pub fn forecast_row(&self, window: &LagWindow, position: usize, history: &History<'_>) -> Vec<f64> {
        let mut row: Vec<f64> = calendar_row(window.next_date(), history.context).to_vec();
        if let Some(profile) = &self.seasonal {
            row.push(profile[position % SEASONAL_PERIOD]);
        }
        row.extend(window.state());
        row
    }
}

fn column<'f>(frame: &'f TimeSeriesFrame, name: &str) -> Result<&'f [f64]> {
    frame
        .column(name)
        .ok_or_else(|| AnalyticsError::ModelTraining(format!("engineered frame lacks {name}")))
}
