//! Plain-language recommendations derived from a forecast.

use chrono::NaiveDate;

use spirit_core::PredictionTarget;

use crate::algorithms::stats;
use crate::types::{AnomalyRecord, AnomalySeverity};

/// Slopes with magnitude below this share of the mean level count as flat.
const FLAT_SLOPE_RATIO: f64 = 1e-4;

/// What the recommender knows besides the forecast itself.
#[derive(Debug, Clone, Copy)]
pub struct InsightContext<'a> {
    pub target: PredictionTarget,
    pub forecast_dates: &'a [NaiveDate],
    /// Historical values; when given, the forecast mean is also placed
    /// against their quartiles in a separate message.
    pub history: Option<&'a [f64]>,
}

/// Index of the largest prediction (first on ties).
pub fn peak_index(predictions: &[f64]) -> Option<usize> {
    predictions
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

#[derive(Debug, Clone, Default)]
pub struct InsightRecommender;

impl InsightRecommender {
    pub fn new() -> Self {
        Self
    }

    pub fn recommend(
        &self,
        predictions: &[f64],
        anomalies: &[AnomalyRecord],
        ctx: &InsightContext<'_>,
    ) -> Vec<String> {
        let mut out = Vec::new();
        if predictions.is_empty() {
            return out;
        }
        let unit = ctx.target.unit();
        let mean = stats::mean(predictions);

        let (slope, _) = stats::linear_fit(predictions);
        let direction = if slope >= 0.0 { "upward" } else { "downward" };
        let target = capitalize(ctx.target.as_str());
        if slope.abs() <= FLAT_SLOPE_RATIO * mean.abs().max(1.0) {
            out.push(format!(
                "{target} shows a slight {direction} trend ({slope:+.2} {unit}/day); keep current operations."
            ));
        } else if slope > 0.0 {
            out.push(format!(
                "{target} shows an upward trend ({slope:+.2} {unit}/day); increase capacity and review pricing for high-demand dates."
            ));
        } else {
            out.push(format!(
                "{target} shows a downward trend ({slope:+.2} {unit}/day); consider promotions or package bundles to stimulate demand."
            ));
        }

        if let Some(peak) = peak_index(predictions) {
            let when = ctx
                .forecast_dates
                .get(peak)
                .map(|d| format!(" ({d})"))
                .unwrap_or_default();
            out.push(format!(
                "Peak {} expected on day {}{}: {:.1} {}.",
                ctx.target,
                peak + 1,
                when,
                predictions[peak],
                unit
            ));
        }

        if !anomalies.is_empty() {
            let high = anomalies
                .iter()
                .filter(|a| a.severity >= AnomalySeverity::High)
                .count();
            out.push(format!(
                "{} anomalies detected in the forecast ({} high severity); review before committing resources.",
                anomalies.len(),
                high
            ));
        }

        let p75 = stats::percentile(predictions, 75.0);
        let p25 = stats::percentile(predictions, 25.0);
        if mean > p75 {
            out.push(format!(
                "Forecast period looks like high season for {}; secure extra guides and inventory early.",
                ctx.target
            ));
        } else if mean < p25 {
            out.push(format!(
                "Forecast period looks like low season for {}; plan maintenance and targeted campaigns.",
                ctx.target
            ));
        }

        if let Some(history) = ctx.history.filter(|h| !h.is_empty()) {
            let (h25, h75) = (stats::percentile(history, 25.0), stats::percentile(history, 75.0));
            if mean > h75 {
                out.push(format!(
                    "Forecast {} runs above the historical upper quartile ({mean:.1} vs {h75:.1} {unit}).",
                    ctx.target
                ));
            } else if mean < h25 {
                out.push(format!(
                    "Forecast {} runs below the historical lower quartile ({mean:.1} vs {h25:.1} {unit}).",
                    ctx.target
                ));
            }
        }

        out
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DetectionMethod;

    fn ctx<'a>(history: Option<&'a [f64]>) -> InsightContext<'a> {
        InsightContext {
            target: PredictionTarget::Demand,
            forecast_dates: &[],
            history,
        }
    }

    #[test]
    fn upward_trend_and_peak() {
        let preds: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let msgs = InsightRecommender::new().recommend(&preds, &[], &ctx(None));
        assert!(msgs[0].contains("upward trend"), "{msgs:?}");
        assert!(msgs[1].contains("day 30"));
        assert_eq!(peak_index(&preds), Some(29));
    }

    #[test]
    fn downward_trend() {
        let preds: Vec<f64> = (0..10).map(|i| 100.0 - 2.0 * i as f64).collect();
        let msgs = InsightRecommender::new().recommend(&preds, &[], &ctx(None));
        assert!(msgs[0].contains("downward trend"));
        assert_eq!(peak_index(&preds), Some(0));
    }

    #[test]
    fn near_flat_forecast_keeps_direction() {
        let msgs = InsightRecommender::new().recommend(&[50.0; 7], &[], &ctx(None));
        assert!(msgs[0].contains("slight upward trend"), "{msgs:?}");
        let drifting: Vec<f64> = (0..7).map(|i| 50.0 - 1e-4 * i as f64).collect();
        let msgs = InsightRecommender::new().recommend(&drifting, &[], &ctx(None));
        assert!(msgs[0].contains("slight downward trend"), "{msgs:?}");
    }

    #[test]
    fn anomaly_count_message() {
        let anomalies = vec![
            AnomalyRecord {
                index: 1,
                date: None,
                value: 1.0,
                methods: vec![DetectionMethod::SuddenChange],
                severity: AnomalySeverity::High,
            },
            AnomalyRecord {
                index: 2,
                date: None,
                value: 1.0,
                methods: vec![DetectionMethod::ZScore],
                severity: AnomalySeverity::Medium,
            },
        ];
        let msgs = InsightRecommender::new().recommend(&[1.0, 2.0, 3.0], &anomalies, &ctx(None));
        assert!(msgs.iter().any(|m| m.starts_with("2 anomalies") && m.contains("1 high")));
    }

    #[test]
    fn season_compares_against_own_quartiles() {
        // A single spike drags the mean above the 75th percentile.
        let mut spiky = vec![10.0; 8];
        spiky[3] = 100.0;
        let high = InsightRecommender::new().recommend(&spiky, &[], &ctx(None));
        assert!(high.iter().any(|m| m.contains("high season")), "{high:?}");

        let mut dipping = vec![100.0; 8];
        dipping[3] = 10.0;
        let low = InsightRecommender::new().recommend(&dipping, &[], &ctx(None));
        assert!(low.iter().any(|m| m.contains("low season")), "{low:?}");
    }

    #[test]
    fn history_quartiles_get_their_own_message() {
        let history: Vec<f64> = (0..100).map(|i| i as f64).collect();
        // Constant forecast: its own quartiles equal its mean, so no season message.
        let high = InsightRecommender::new().recommend(&[95.0; 5], &[], &ctx(Some(&history)));
        assert!(!high.iter().any(|m| m.contains("season")), "{high:?}");
        assert!(high.iter().any(|m| m.contains("above the historical upper quartile")));

        let low = InsightRecommender::new().recommend(&[5.0; 5], &[], &ctx(Some(&history)));
        assert!(!low.iter().any(|m| m.contains("season")));
        assert!(low.iter().any(|m| m.contains("below the historical lower quartile")));
    }

    #[test]
    fn empty_predictions_yield_nothing() {
        assert!(InsightRecommender::new().recommend(&[], &[], &ctx(None)).is_empty());
    }
}
