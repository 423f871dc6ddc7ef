//! Per-customer ring buffer of recent sentiment scores.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{SentimentAnalysisRecord, SentimentLevel};

/// Half-window mean difference that counts as a change of direction.
const DIRECTION_DELTA: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub interaction_id: String,
    pub score: f64,
    pub level: SentimentLevel,
}

impl From<&SentimentAnalysisRecord> for TrendPoint {
    fn from(record: &SentimentAnalysisRecord) -> Self {
        Self {
            timestamp: record.analyzed_at,
            interaction_id: record.interaction_id.clone(),
            score: record.analysis.sentiment_score,
            level: record.analysis.overall_sentiment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Stable,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub customer_id: String,
    pub samples: usize,
    pub average_score: f64,
    /// Share of samples with a negative or very negative level.
    pub negative_ratio: f64,
    pub latest_score: f64,
    pub direction: TrendDirection,
}

/// Thread-safe trend buffers keyed by customer. Cloning shares the buffers.
#[derive(Debug, Clone)]
pub struct TrendStore {
    window: usize,
    trends: Arc<RwLock<HashMap<String, VecDeque<TrendPoint>>>>,
}

impl TrendStore {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            trends: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Append a point, evicting the oldest once the window is full.
    pub fn push(&self, customer_id: &str, point: TrendPoint) {
        let mut trends = self.trends.write().unwrap_or_else(|e| e.into_inner());
        let buf = trends.entry(customer_id.to_string()).or_default();
        Self::append(buf, point, self.window);
    }

    /// Count the stored run below `threshold`, then append `point`, under
    /// one lock. The count does not include `point`, and two callers for the
    /// same customer always see different runs.
    pub fn record_and_count(&self, customer_id: &str, point: TrendPoint, threshold: f64) -> usize {
        let mut trends = self.trends.write().unwrap_or_else(|e| e.into_inner());
        let buf = trends.entry(customer_id.to_string()).or_default();
        let streak = buf.iter().rev().take_while(|p| p.score < threshold).count();
        Self::append(buf, point, self.window);
        streak
    }

    fn append(buf: &mut VecDeque<TrendPoint>, point: TrendPoint, window: usize) {
        if buf.len() == window {
            buf.pop_front();
        }
        buf.push_back(point);
    }

    /// Stored points for `customer_id`, oldest first.
    pub fn points(&self, customer_id: &str) -> Vec<TrendPoint> {
        self.trends
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(customer_id)
            .map(|b| b.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Length of the run of stored scores below `threshold`, counted from
    /// the newest point back to the first one that is not below it.
    pub fn consecutive_negative(&self, customer_id: &str, threshold: f64) -> usize {
        self.trends
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(customer_id)
            .map(|b| b.iter().rev().take_while(|p| p.score < threshold).count())
            .unwrap_or(0)
    }

    pub fn summary(&self, customer_id: &str) -> Option<TrendSummary> {
        let trends = self.trends.read().unwrap_or_else(|e| e.into_inner());
        let buf = trends.get(customer_id).filter(|b| !b.is_empty())?;
        let n = buf.len();
        let scores: Vec<f64> = buf.iter().map(|p| p.score).collect();
        let negatives = buf.iter().filter(|p| p.level.is_negative()).count();

        let direction = if n < 2 {
            TrendDirection::Stable
        } else {
            let (older, recent) = scores.split_at(n / 2);
            let delta = mean(recent) - mean(older);
            if delta > DIRECTION_DELTA {
                TrendDirection::Improving
            } else if delta < -DIRECTION_DELTA {
                TrendDirection::Declining
            } else {
                TrendDirection::Stable
            }
        };

        Some(TrendSummary {
            customer_id: customer_id.to_string(),
            samples: n,
            average_score: mean(&scores),
            negative_ratio: negatives as f64 / n as f64,
            latest_score: scores[n - 1],
            direction,
        })
    }

    pub fn customers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .trends
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}

fn mean(v: &[f64]) -> f64 {
    v.iter().sum::<f64>() / v.len().max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(score: f64) -> TrendPoint {
        TrendPoint {
            timestamp: Utc::now(),
            interaction_id: "i".into(),
            score,
            level: SentimentLevel::from_score(score),
        }
    }

    #[test]
    fn window_evicts_oldest() {
        let store = TrendStore::new(3);
        for s in [0.1, 0.2, 0.3, 0.4] {
            store.push("c1", point(s));
        }
        let scores: Vec<f64> = store.points("c1").iter().map(|p| p.score).collect();
        assert_eq!(scores, [0.2, 0.3, 0.4]);
    }

    #[test]
    fn streak_stops_at_first_non_negative() {
        let store = TrendStore::new(50);
        for s in [-0.9, -0.5, 0.4, -0.3, -0.25] {
            store.push("c1", point(s));
        }
        assert_eq!(store.consecutive_negative("c1", -0.2), 2);
        assert_eq!(store.consecutive_negative("c1", -0.4), 0);
        assert_eq!(store.consecutive_negative("unknown", -0.2), 0);
    }

    #[test]
    fn record_and_count_reports_the_run_before_the_new_point() {
        let store = TrendStore::new(50);
        assert_eq!(store.record_and_count("c1", point(-0.3), -0.2), 0);
        assert_eq!(store.record_and_count("c1", point(-0.4), -0.2), 1);
        assert_eq!(store.record_and_count("c1", point(0.5), -0.2), 2);
        assert_eq!(store.record_and_count("c1", point(-0.3), -0.2), 0);
        assert_eq!(store.points("c1").len(), 4);
    }

    #[test]
    fn concurrent_records_see_distinct_runs() {
        let store = TrendStore::new(50);
        let barrier = std::sync::Barrier::new(8);
        let mut counts: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        store.record_and_count("c1", point(-0.5), -0.2)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        counts.sort_unstable();
        assert_eq!(counts, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn summary_statistics() {
        let store = TrendStore::new(50);
        for s in [0.6, 0.5, -0.3, -0.7] {
            store.push("c1", point(s));
        }
        let summary = store.summary("c1").unwrap();
        assert_eq!(summary.samples, 4);
        assert!((summary.average_score - 0.025).abs() < 1e-9);
        assert_eq!(summary.negative_ratio, 0.5);
        assert_eq!(summary.latest_score, -0.7);
        assert_eq!(summary.direction, TrendDirection::Declining);
        assert!(store.summary("nobody").is_none());
    }

    #[test]
    fn clones_share_buffers() {
        let a = TrendStore::new(5);
        let b = a.clone();
        a.push("c1", point(0.5));
        assert_eq!(b.points("c1").len(), 1);
        assert_eq!(b.customers(), ["c1"]);
    }
}
