//! Anomaly detection over historical or forecast series.
//!
//! Runs the signals in [`signals`] independently and merges their flags by
//! index. A point flagged by two or more methods where at least one of them
//! rated it high is escalated to critical.

pub mod signals;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::types::{AnomalyRecord, AnomalySeverity};

use self::signals::Flag;

/// Default sensitivity; contamination is `1 - sensitivity`.
pub const DEFAULT_SENSITIVITY: f64 = 0.95;

/// Which series is being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Historical,
    /// Forecast output; also checked for sudden step changes.
    Forecast,
}

#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    sensitivity: f64,
    seed: u64,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVITY)
    }
}

impl AnomalyDetector {
    pub fn new(sensitivity: f64) -> Self {
        Self {
            sensitivity: sensitivity.clamp(0.5, 1.0),
            seed: 42,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn contamination(&self) -> f64 {
        1.0 - self.sensitivity
    }

    /// Detect anomalies in `values`. `dates`, when given, must align with
    /// `values` and is copied onto each record.
    pub fn detect(
        &self,
        values: &[f64],
        dates: Option<&[NaiveDate]>,
        kind: SeriesKind,
    ) -> Vec<AnomalyRecord> {
        let mut flags = signals::zscore_flags(values);
        flags.extend(signals::isolation_flags(values, self.contamination(), self.seed));
        if kind == SeriesKind::Forecast {
            flags.extend(signals::sudden_change_flags(values));
        }

        let records = merge(flags, values, dates);
        debug!(
            points = values.len(),
            anomalies = records.len(),
            forecast = kind == SeriesKind::Forecast,
            "anomaly detection complete"
        );
        records
    }
}

fn merge(flags: Vec<Flag>, values: &[f64], dates: Option<&[NaiveDate]>) -> Vec<AnomalyRecord> {
    let mut by_index: BTreeMap<usize, Vec<Flag>> = BTreeMap::new();
    for flag in flags {
        by_index.entry(flag.index).or_default().push(flag);
    }

    by_index
        .into_iter()
        .map(|(index, hits)| {
            let mut methods: Vec<_> = Vec::with_capacity(hits.len());
            for hit in &hits {
                if !methods.contains(&hit.method) {
                    methods.push(hit.method);
                }
            }
            let top = hits
                .iter()
                .map(|h| h.severity)
                .max()
                .unwrap_or(AnomalySeverity::Medium);
            let severity = if methods.len() >= 2 && top >= AnomalySeverity::High {
                AnomalySeverity::Critical
            } else {
                top
            };
            AnomalyRecord {
                index,
                date: dates.and_then(|d| d.get(index).copied()),
                value: values[index],
                methods,
                severity,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DetectionMethod;

    #[test]
    fn spike_found_by_both_methods_is_critical() {
        let mut v: Vec<f64> = (0..60).map(|i| 50.0 + (i % 4) as f64).collect();
        v[30] = 500.0;
        let records = AnomalyDetector::default().detect(&v, None, SeriesKind::Historical);
        let spike = records.iter().find(|r| r.index == 30).unwrap();
        assert!(spike.methods.contains(&DetectionMethod::ZScore));
        assert!(spike.methods.contains(&DetectionMethod::IsolationForest));
        assert_eq!(spike.severity, AnomalySeverity::Critical);
        assert_eq!(spike.method(), Some(DetectionMethod::ZScore));
    }

    #[test]
    fn records_are_unique_per_index_and_dated() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let v = vec![10.0, 10.0, 30.0, 10.0, 10.0];
        let dates: Vec<NaiveDate> = start.iter_days().take(v.len()).collect();
        let records = AnomalyDetector::default().detect(&v, Some(&dates), SeriesKind::Forecast);
        let mut idx: Vec<usize> = records.iter().map(|r| r.index).collect();
        idx.dedup();
        assert_eq!(idx.len(), records.len());
        let jump = records.iter().find(|r| r.index == 2).unwrap();
        assert_eq!(jump.date, Some(dates[2]));
        assert_eq!(jump.methods, vec![DetectionMethod::SuddenChange]);
        assert_eq!(jump.severity, AnomalySeverity::High);
    }

    #[test]
    fn historical_mode_ignores_step_changes() {
        let v = vec![10.0, 10.0, 30.0, 10.0, 10.0];
        assert!(AnomalyDetector::default()
            .detect(&v, None, SeriesKind::Historical)
            .is_empty());
    }

    #[test]
    fn empty_series_is_fine() {
        assert!(AnomalyDetector::default()
            .detect(&[], None, SeriesKind::Forecast)
            .is_empty());
    }
}
