use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Forecast pipeline metrics, updated after every completed or failed run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineMetrics {
    /// Runs that produced a result.
    pub runs_completed: u64,
    /// Runs that returned an error (including timeouts).
    pub runs_failed: u64,
    /// When the last successful run finished.
    pub last_run: Option<DateTime<Utc>>,
    /// Duration of the last successful run in milliseconds.
    pub last_duration_ms: u64,
    /// Average successful run duration in milliseconds.
    pub avg_duration_ms: f64,
    /// How often each model was excluded from an ensemble, keyed by model name.
    pub model_exclusions: HashMap<String, u64>,

    #[serde(skip)]
    total_duration_ms: f64,
}

impl PipelineMetrics {
    /// Record a successful run and the models it had to drop.
    pub fn record_run<'a>(
        &mut self,
        elapsed: Duration,
        excluded: impl IntoIterator<Item = &'a str>,
    ) {
        let ms = elapsed.as_secs_f64() * 1000.0;
        self.runs_completed += 1;
        self.total_duration_ms += ms;
        self.last_run = Some(Utc::now());
        self.last_duration_ms = elapsed.as_millis() as u64;
        self.avg_duration_ms = self.total_duration_ms / self.runs_completed as f64;
        for model in excluded {
            *self.model_exclusions.entry(model.to_owned()).or_insert(0) += 1;
        }
    }

    pub fn record_failure(&mut self) {
        self.runs_failed += 1;
    }
}
