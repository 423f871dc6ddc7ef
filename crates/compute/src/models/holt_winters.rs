use spirit_core::{AnalyticsError, Result};

use super::{ensure_history, ForecastModel, History, HyperParams, ModelForecast, ModelKind};

/// Weekly seasonality for daily data.
const SEASON: usize = 7;

/// Additive Holt-Winters (level + trend + weekly season).
#[derive(Debug, Clone)]
pub struct HoltWinters {
    alpha: f64,
    beta: f64,
    gamma: f64,
}

impl HoltWinters {
    pub fn new(params: &HyperParams) -> Self {
        Self {
            alpha: params.get_or("alpha", 0.3).clamp(0.01, 0.99),
            beta: params.get_or("beta", 0.05).clamp(0.0, 0.99),
            gamma: params.get_or("gamma", 0.1).clamp(0.0, 0.99),
        }
    }
}

impl ForecastModel for HoltWinters {
    fn kind(&self) -> ModelKind {
        ModelKind::HoltWinters
    }

    fn min_history(&self) -> usize {
        2 * SEASON
    }

    fn fit_forecast(&self, history: History<'_>, horizon: usize) -> Result<ModelForecast> {
        ensure_history(self, &history)?;
        let y = history.values;

        let first: f64 = y[..SEASON].iter().sum::<f64>() / SEASON as f64;
        let second: f64 = y[SEASON..2 * SEASON].iter().sum::<f64>() / SEASON as f64;
        let mut level = first;
        let mut trend = (second - first) / SEASON as f64;
        let mut season: Vec<f64> = y[..SEASON].iter().map(|v| v - first).collect();

        for (t, &obs) in y.iter().enumerate().skip(SEASON) {
            let s = season[t % SEASON];
            let prev_level = level;
            level = self.alpha * (obs - s) + (1.0 - self.alpha) * (level + trend);
            trend = self.beta * (level - prev_level) + (1.0 - self.beta) * trend;
            season[t % SEASON] = self.gamma * (obs - level) + (1.0 - self.gamma) * s;
        }

        let n = y.len();
        let predictions: Vec<f64> = (1..=horizon)
            .map(|h| level + h as f64 * trend + season[(n + h - 1) % SEASON])
            .collect();

        if predictions.iter().any(|v| !v.is_finite()) {
            return Err(AnalyticsError::ModelTraining(
                "holt-winters produced non-finite values".into(),
            ));
        }
        Ok(ModelForecast::plain(predictions))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn follows_trend_and_weekly_pattern() {
        let values: Vec<f64> = (0..140)
            .map(|i| 100.0 + 0.5 * i as f64 + if i % 7 >= 5 { 20.0 } else { 0.0 })
            .collect();
        let dates: Vec<NaiveDate> = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .iter_days()
            .take(values.len())
            .collect();
        let model = HoltWinters::new(&HyperParams::default());
        let out = model.fit_forecast(History::new(&dates, &values), 14).unwrap();
        assert_eq!(out.predictions.len(), 14);

        // Step 0 is index 140 (140 % 7 == 0, weekday), step 5 is a weekend day.
        assert!(out.predictions[5] > out.predictions[4] + 10.0);
        assert!(out.predictions[7] > out.predictions[0]);
    }
}
