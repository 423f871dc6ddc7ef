//! Individual anomaly signals.
//!
//! - Signal 1: statistical outlier (population z-score)
//! - Signal 2: isolation forest density outlier
//! - Signal 3: sudden step-to-step change (forecast series only)
//!
//! Each signal skips silently when the series is too short for it.

use crate::algorithms::isolation_forest::{IsolationForest, IsolationForestConfig};
use crate::algorithms::stats;
use crate::types::{AnomalySeverity, DetectionMethod};

/// |z| above which a point is flagged.
pub const Z_THRESHOLD: f64 = 3.0;
/// |z| above which a flagged point is high severity.
pub const Z_HIGH: f64 = 4.0;
/// Relative step change above which a forecast point is flagged.
pub const CHANGE_THRESHOLD: f64 = 0.5;
/// Relative step change above which a flagged point is high severity.
pub const CHANGE_HIGH: f64 = 1.0;

pub const MIN_POINTS_ZSCORE: usize = 3;
pub const MIN_POINTS_FOREST: usize = 10;

/// A single signal hit before merging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flag {
    pub index: usize,
    pub method: DetectionMethod,
    pub severity: AnomalySeverity,
}

/// Signal 1: flag points with |z| > 3 against the series mean/std.
pub fn zscore_flags(values: &[f64]) -> Vec<Flag> {
    if values.len() < MIN_POINTS_ZSCORE {
        return Vec::new();
    }
    let mean = stats::mean(values);
    let std = stats::std_dev(values);
    if std <= f64::EPSILON {
        return Vec::new();
    }
    values
        .iter()
        .enumerate()
        .filter_map(|(index, &v)| {
            let z = stats::z_score(v, mean, std).abs();
            (z > Z_THRESHOLD).then_some(Flag {
                index,
                method: DetectionMethod::ZScore,
                severity: if z > Z_HIGH {
                    AnomalySeverity::High
                } else {
                    AnomalySeverity::Medium
                },
            })
        })
        .collect()
}

/// Signal 2: flag the isolation forest's outliers at the given contamination.
pub fn isolation_flags(values: &[f64], contamination: f64, seed: u64) -> Vec<Flag> {
    if values.len() < MIN_POINTS_FOREST || contamination <= 0.0 {
        return Vec::new();
    }
    let rows: Vec<Vec<f64>> = values.iter().map(|v| vec![*v]).collect();
    let forest = IsolationForest::fit(
        &rows,
        &IsolationForestConfig {
            contamination,
            seed,
            ..Default::default()
        },
    );
    rows.iter()
        .enumerate()
        .filter(|(_, row)| forest.is_outlier(row))
        .map(|(index, _)| Flag {
            index,
            method: DetectionMethod::IsolationForest,
            severity: AnomalySeverity::Medium,
        })
        .collect()
}

/// Signal 3: flag steps whose relative change exceeds 50%.
pub fn sudden_change_flags(values: &[f64]) -> Vec<Flag> {
    values
        .windows(2)
        .enumerate()
        .filter_map(|(i, w)| {
            let prev = w[0];
            if prev.abs() <= f64::EPSILON {
                return None;
            }
            let change = ((w[1] - prev) / prev).abs();
            (change > CHANGE_THRESHOLD).then_some(Flag {
                index: i + 1,
                method: DetectionMethod::SuddenChange,
                severity: if change > CHANGE_HIGH {
                    AnomalySeverity::High
                } else {
                    AnomalySeverity::Medium
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_with_spike(spike: f64) -> Vec<f64> {
        let mut v: Vec<f64> = (0..50).map(|i| 10.0 + (i % 3) as f64 * 0.1).collect();
        v[25] = spike;
        v
    }

    #[test]
    fn zscore_flags_spike() {
        let flags = zscore_flags(&flat_with_spike(100.0));
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].index, 25);
        assert_eq!(flags[0].severity, AnomalySeverity::High);
    }

    #[test]
    fn zscore_skips_short_or_constant() {
        assert!(zscore_flags(&[1.0, 100.0]).is_empty());
        assert!(zscore_flags(&[5.0; 20]).is_empty());
    }

    #[test]
    fn isolation_flags_spike() {
        let flags = isolation_flags(&flat_with_spike(100.0), 0.02, 7);
        assert!(flags.iter().any(|f| f.index == 25));
        assert!(isolation_flags(&[1.0; 5], 0.05, 7).is_empty());
    }

    #[test]
    fn sudden_change_thresholds() {
        let flags = sudden_change_flags(&[10.0, 12.0, 19.0, 40.0, 0.0, 5.0]);
        let got: Vec<(usize, AnomalySeverity)> =
            flags.iter().map(|f| (f.index, f.severity)).collect();
        // 12 -> 19 is +58%, 19 -> 40 is +110%, 40 -> 0 is -100%, 0 -> 5 is skipped.
        assert_eq!(
            got,
            vec![
                (2, AnomalySeverity::Medium),
                (3, AnomalySeverity::High),
                (4, AnomalySeverity::Medium),
            ]
        );
    }
}
