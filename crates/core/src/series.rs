use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// Ordered daily series with optional covariate columns.
///
/// Dates are strictly increasing; this is checked on construction and every
/// derived frame preserves it because rows are only ever dropped, never
/// reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesFrame {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
    columns: IndexMap<String, Vec<f64>>,
}

/// A single observation, used when building frames from external input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl TimeSeriesFrame {
    /// Build a frame from parallel date/value vectors.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(AnalyticsError::Validation(format!(
                "{} dates but {} values",
                dates.len(),
                values.len()
            )));
        }
        if let Some(pos) = dates.windows(2).position(|w| w[1] <= w[0]) {
            return Err(AnalyticsError::Validation(format!(
                "dates must be strictly increasing (violation at {} -> {})",
                dates[pos],
                dates[pos + 1]
            )));
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(AnalyticsError::Validation(format!(
                "non-finite value at {}",
                dates[pos]
            )));
        }
        Ok(Self {
            dates,
            values,
            columns: IndexMap::new(),
        })
    }

    pub fn from_observations(obs: &[Observation]) -> Result<Self> {
        Self::new(
            obs.iter().map(|o| o.date).collect(),
            obs.iter().map(|o| o.value).collect(),
        )
    }

    /// Consecutive daily series starting at `start`.
    pub fn daily(start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        let dates = start.iter_days().take(values.len()).collect();
        Self::new(dates, values)
    }

    /// Attach a covariate column. Length must match the frame.
    pub fn with_column(mut self, name: impl Into<String>, data: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if data.len() != self.len() {
            return Err(AnalyticsError::Validation(format!(
                "column '{}' has {} rows, frame has {}",
                name,
                data.len(),
                self.len()
            )));
        }
        self.columns.insert(name, data);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|c| c.as_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Return a copy with `extra` columns appended. Existing columns with the
    /// same name are kept as they are.
    pub fn extend_columns(&self, extra: Vec<(String, Vec<f64>)>) -> Self {
        let mut out = self.clone();
        for (name, data) in extra {
            if data.len() == out.len() && !out.columns.contains_key(&name) {
                out.columns.insert(name, data);
            }
        }
        out
    }

    /// Drop every row that has a NaN in any column.
    pub fn drop_incomplete_rows(&self) -> Self {
        let keep: Vec<bool> = (0..self.len())
            .map(|i| {
                self.values[i].is_finite()
                    && self.columns.values().all(|col| col[i].is_finite())
            })
            .collect();

        let pick = |src: &[f64]| -> Vec<f64> {
            src.iter()
                .zip(&keep)
                .filter_map(|(v, k)| k.then_some(*v))
                .collect()
        };

        let columns = self
            .columns
            .iter()
            .map(|(name, col)| (name.clone(), pick(col)))
            .collect();

        Self {
            dates: self
                .dates
                .iter()
                .zip(&keep)
                .filter_map(|(d, k)| k.then_some(*d))
                .collect(),
            values: pick(&self.values),
            columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, n).unwrap()
    }

    #[test]
    fn rejects_unordered_dates() {
        let err = TimeSeriesFrame::new(vec![day(2), day(1)], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, AnalyticsError::Validation(_)));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = TimeSeriesFrame::new(vec![day(1), day(1)], vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, AnalyticsError::Validation(_)));
    }

    #[test]
    fn rejects_length_mismatch() {
        assert!(TimeSeriesFrame::new(vec![day(1)], vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn daily_builds_consecutive_dates() {
        let frame = TimeSeriesFrame::daily(day(1), vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(frame.dates(), &[day(1), day(2), day(3)]);
    }

    #[test]
    fn extend_does_not_overwrite_existing_columns() {
        let frame = TimeSeriesFrame::daily(day(1), vec![1.0, 2.0])
            .unwrap()
            .with_column("a", vec![9.0, 9.0])
            .unwrap();
        let out = frame.extend_columns(vec![
            ("a".to_string(), vec![0.0, 0.0]),
            ("b".to_string(), vec![1.0, 1.0]),
        ]);
        assert_eq!(out.column("a"), Some(&[9.0, 9.0][..]));
        assert_eq!(out.column_names().collect::<Vec<_>>(), vec!["a", "b"]);
        // Source frame untouched.
        assert!(!frame.has_column("b"));
    }

    #[test]
    fn drop_incomplete_rows_removes_nan_rows() {
        let frame = TimeSeriesFrame::daily(day(1), vec![1.0, 2.0, 3.0])
            .unwrap()
            .with_column("lag", vec![f64::NAN, 1.0, 2.0])
            .unwrap();
        let out = frame.drop_incomplete_rows();
        assert_eq!(out.len(), 2);
        assert_eq!(out.dates()[0], day(2));
        assert_eq!(out.column("lag"), Some(&[1.0, 2.0][..]));
    }
}
