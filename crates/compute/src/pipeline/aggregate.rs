//! Performance-weighted blending of ensemble forecasts.
//!
//! Weights are inverse hold-out RMSE, normalized. The interval half-width
//! at each step is the cross-model standard deviation times the z value of
//! the confidence level; a lone model uses 10% of its prediction magnitude.
//! Everything here is a pure function of its inputs.

use indexmap::IndexMap;

use spirit_core::{AnalyticsError, Result, TimeSeriesFrame};

use super::ensemble::ModelRun;
use crate::algorithms::stats;
use crate::types::{BaselineComparison, ConfidenceInterval};

/// Guards against division by zero for a perfect hold-out score.
const WEIGHT_EPSILON: f64 = 1e-8;

/// Std approximation for a single-model ensemble, as a share of |prediction|.
const SINGLE_MODEL_SPREAD: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub predictions: Vec<f64>,
    pub interval: ConfidenceInterval,
    /// Model name to normalized weight, in run order.
    pub weights: IndexMap<String, f64>,
}

/// Normalized inverse-RMSE weights.
pub fn weights(rmse: &[f64]) -> Vec<f64> {
    let raw: Vec<f64> = rmse.iter().map(|r| 1.0 / (r.max(0.0) + WEIGHT_EPSILON)).collect();
    let total: f64 = raw.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return vec![1.0 / rmse.len().max(1) as f64; rmse.len()];
    }
    raw.iter().map(|w| w / total).collect()
}

/// Blend `runs` into one forecast with a confidence interval.
pub fn aggregate(runs: &[ModelRun], confidence_level: f64) -> Result<Aggregate> {
    let first = runs
        .first()
        .ok_or_else(|| AnalyticsError::ModelTraining("no model results to aggregate".into()))?;
    let horizon = first.predictions.len();
    if let Some(bad) = runs.iter().find(|r| r.predictions.len() != horizon) {
        return Err(AnalyticsError::Validation(format!(
            "{} returned {} predictions, expected {horizon}",
            bad.kind,
            bad.predictions.len()
        )));
    }

    let rmse: Vec<f64> = runs.iter().map(|r| r.performance.rmse).collect();
    let w = weights(&rmse);
    let z = stats::z_for_confidence(confidence_level);

    let mut predictions = Vec::with_capacity(horizon);
    let mut lower = Vec::with_capacity(horizon);
    let mut upper = Vec::with_capacity(horizon);
    for step in 0..horizon {
        let column: Vec<f64> = runs.iter().map(|r| r.predictions[step]).collect();
        let blended: f64 = column.iter().zip(&w).map(|(p, w)| p * w).sum();
        let spread = if runs.len() >= 2 {
            stats::std_dev(&column)
        } else {
            SINGLE_MODEL_SPREAD * blended.abs()
        };
        predictions.push(blended);
        lower.push(blended - z * spread);
        upper.push(blended + z * spread);
    }

    Ok(Aggregate {
        predictions,
        interval: ConfidenceInterval {
            level: confidence_level,
            lower,
            upper,
        },
        weights: runs
            .iter()
            .zip(w)
            .map(|(r, w)| (r.kind.to_string(), w))
            .collect(),
    })
}

/// Compare the forecast mean with the mean of the last `horizon` observations.
pub fn baseline_comparison(history: &[f64], predictions: &[f64]) -> BaselineComparison {
    let window = predictions.len().min(history.len());
    let baseline_mean = stats::mean(&history[history.len() - window..]);
    let forecast_mean = stats::mean(predictions);
    let delta = forecast_mean - baseline_mean;
    BaselineComparison {
        baseline_mean,
        forecast_mean,
        delta,
        delta_pct: (baseline_mean.abs() > f64::EPSILON).then(|| 100.0 * delta / baseline_mean),
    }
}

/// Feature importance for the blended forecast.
///
/// Tree models report split gains; those are combined using the ensemble
/// weights. Without any tree model the absolute correlation of each
/// engineered column with the target is used instead. Either way the result
/// sums to 1, or is empty when nothing carries signal.
pub fn feature_importance(
    runs: &[ModelRun],
    model_weights: &IndexMap<String, f64>,
    engineered: &TimeSeriesFrame,
) -> IndexMap<String, f64> {
    let mut scores: IndexMap<String, f64> = IndexMap::new();
    for run in runs {
        let Some(gains) = &run.feature_gains else { continue };
        let total: f64 = gains.iter().map(|(_, g)| g).sum();
        if total <= 0.0 {
            continue;
        }
        let w = model_weights.get(run.kind.as_str()).copied().unwrap_or(0.0);
        for (name, g) in gains {
            *scores.entry(name.clone()).or_insert(0.0) += w * g / total;
        }
    }

    if scores.values().all(|v| *v <= 0.0) {
        scores = engineered
            .columns()
            .map(|(name, col)| (name.to_string(), stats::pearson(col, engineered.values()).abs()))
            .collect();
    }

    let total: f64 = scores.values().sum();
    if total <= 0.0 || !total.is_finite() {
        return IndexMap::new();
    }
    scores.values_mut().for_each(|v| *v /= total);
    scores.sort_by(|_, a, _, b| b.total_cmp(a));
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HyperParams, ModelKind, ModelPerformance};

    fn run(kind: ModelKind, preds: Vec<f64>, rmse: f64) -> ModelRun {
        ModelRun {
            kind,
            params: HyperParams::default(),
            predictions: preds,
            performance: ModelPerformance {
                mae: rmse,
                rmse,
                mape: None,
                r2: None,
            },
            feature_gains: None,
        }
    }

    #[test]
    fn weights_sum_to_one_for_any_count() {
        for n in 1..=6 {
            let rmse: Vec<f64> = (0..n).map(|i| 0.5 + i as f64).collect();
            let w = weights(&rmse);
            assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-6, "n={n}");
        }
        // A perfect model does not blow up.
        let w = weights(&[0.0, 1.0]);
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-6);
        assert!(w[0] > 0.99);
    }

    #[test]
    fn better_model_gets_more_weight() {
        let runs = vec![
            run(ModelKind::Autoregressive, vec![10.0, 10.0], 1.0),
            run(ModelKind::HoltWinters, vec![20.0, 20.0], 3.0),
        ];
        let agg = aggregate(&runs, 0.95).unwrap();
        assert!((agg.predictions[0] - 12.5).abs() < 1e-6);
        assert!(agg.weights["autoregressive"] > agg.weights["holt_winters"]);
    }

    #[test]
    fn interval_brackets_prediction() {
        let runs = vec![
            run(ModelKind::Autoregressive, vec![10.0, 12.0, 14.0], 1.0),
            run(ModelKind::HoltWinters, vec![11.0, 12.0, 18.0], 2.0),
            run(ModelKind::GradientBoosting, vec![9.0, 12.0, 13.0], 1.5),
        ];
        let agg = aggregate(&runs, 0.95).unwrap();
        for i in 0..3 {
            assert!(agg.interval.lower[i] <= agg.predictions[i]);
            assert!(agg.predictions[i] <= agg.interval.upper[i]);
        }
        // Models agree at step 1, so the band collapses.
        assert!((agg.interval.upper[1] - agg.interval.lower[1]).abs() < 1e-9);
    }

    #[test]
    fn single_model_uses_ten_percent_spread() {
        let runs = vec![run(ModelKind::HoltWinters, vec![100.0], 2.0)];
        let agg = aggregate(&runs, 0.95).unwrap();
        let half = agg.interval.upper[0] - agg.predictions[0];
        assert!((half - 1.959964 * 10.0).abs() < 1e-3);
    }

    #[test]
    fn aggregation_is_deterministic() {
        let runs = vec![
            run(ModelKind::Autoregressive, vec![1.0, 2.0], 0.3),
            run(ModelKind::HoltWinters, vec![1.5, 2.5], 0.7),
        ];
        assert_eq!(aggregate(&runs, 0.9).unwrap(), aggregate(&runs, 0.9).unwrap());
    }

    #[test]
    fn empty_and_ragged_inputs_fail() {
        assert!(matches!(aggregate(&[], 0.95), Err(AnalyticsError::ModelTraining(_))));
        let runs = vec![
            run(ModelKind::Autoregressive, vec![1.0, 2.0], 0.3),
            run(ModelKind::HoltWinters, vec![1.5], 0.7),
        ];
        assert!(matches!(aggregate(&runs, 0.95), Err(AnalyticsError::Validation(_))));
    }

    #[test]
    fn baseline_uses_recent_window() {
        let b = baseline_comparison(&[1.0, 1.0, 10.0, 10.0], &[12.0, 12.0]);
        assert_eq!(b.baseline_mean, 10.0);
        assert_eq!(b.delta, 2.0);
        assert_eq!(b.delta_pct, Some(20.0));
    }

    #[test]
    fn importance_from_tree_gains_sums_to_one() {
        let mut tree = run(ModelKind::GradientBoosting, vec![1.0], 1.0);
        tree.feature_gains = Some(vec![("lag_1_delta".into(), 3.0), ("month".into(), 1.0)]);
        let runs = vec![tree, run(ModelKind::HoltWinters, vec![1.0], 1.0)];
        let agg = aggregate(&runs, 0.95).unwrap();
        let frame = TimeSeriesFrame::daily(
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            vec![1.0, 2.0],
        )
        .unwrap();
        let imp = feature_importance(&runs, &agg.weights, &frame);
        assert!((imp.values().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(imp.get_index(0).unwrap().0, "lag_1_delta");
    }

    #[test]
    fn importance_falls_back_to_correlation() {
        let frame = TimeSeriesFrame::daily(
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            vec![1.0, 2.0, 3.0, 5.0],
        )
        .unwrap()
        .with_column("trend", vec![0.0, 1.0, 2.0, 3.0])
        .unwrap()
        .with_column("noise", vec![1.0, -1.0, 1.0, -1.0])
        .unwrap();
        let runs = vec![run(ModelKind::HoltWinters, vec![1.0], 1.0)];
        let agg = aggregate(&runs, 0.95).unwrap();
        let imp = feature_importance(&runs, &agg.weights, &frame);
        assert!((imp.values().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(imp["trend"] > imp["noise"]);
    }
}
