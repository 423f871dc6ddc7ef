use serde::{Deserialize, Serialize};

/// Hold-out accuracy of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPerformance {
    pub mae: f64,
    pub rmse: f64,
    /// Mean absolute percentage error over non-zero actuals.
    pub mape: Option<f64>,
    /// Coefficient of determination; `None` when actuals have no variance.
    pub r2: Option<f64>,
}

impl ModelPerformance {
    /// Score `predicted` against `actual` (truncated to the shorter length).
    pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Self {
        let n = actual.len().min(predicted.len());
        if n == 0 {
            return Self {
                mae: f64::NAN,
                rmse: f64::NAN,
                mape: None,
                r2: None,
            };
        }
        let (actual, predicted) = (&actual[..n], &predicted[..n]);

        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        let mut pct_sum = 0.0;
        let mut pct_n = 0usize;
        for (a, p) in actual.iter().zip(predicted) {
            let err = a - p;
            abs_sum += err.abs();
            sq_sum += err * err;
            if a.abs() > f64::EPSILON {
                pct_sum += (err / a).abs();
                pct_n += 1;
            }
        }

        let mean = actual.iter().sum::<f64>() / n as f64;
        let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

        Self {
            mae: abs_sum / n as f64,
            rmse: (sq_sum / n as f64).sqrt(),
            mape: (pct_n > 0).then(|| 100.0 * pct_sum / pct_n as f64),
            r2: (ss_tot > f64::EPSILON).then(|| 1.0 - sq_sum / ss_tot),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.mae.is_finite() && self.rmse.is_finite()
    }
}
