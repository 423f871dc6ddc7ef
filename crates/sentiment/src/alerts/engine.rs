use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use spirit_core::{AnalyticsError, Result};

use super::{AlertKind, AlertPolicy, AlertReason, AlertSeverity, AlertStatus, SentimentAlert};
use crate::trend::{TrendPoint, TrendStore};
use crate::types::{SentimentAnalysisRecord, UrgencyLevel};

/// Scores at or below this make a multi-reason alert high severity on their own.
const SEVERE_SCORE: f64 = -0.8;

/// Evaluates analyses against the alert policy, keeps the alert log and
/// enforces per-customer cooldowns.
#[derive(Debug)]
pub struct AlertEngine {
    policy: AlertPolicy,
    alerts: RwLock<IndexMap<Uuid, SentimentAlert>>,
    /// Last time each (customer, kind) pair raised an alert.
    cooldowns: RwLock<HashMap<(String, AlertKind), DateTime<Utc>>>,
}

impl AlertEngine {
    pub fn new(policy: AlertPolicy) -> Self {
        Self {
            policy,
            alerts: RwLock::new(IndexMap::new()),
            cooldowns: RwLock::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    /// Reasons the policy finds in `record`, before cooldowns. `stored_streak`
    /// is the customer's negative run not counting this record.
    pub fn reasons(&self, record: &SentimentAnalysisRecord, stored_streak: usize) -> Vec<AlertReason> {
        let p = &self.policy;
        let a = &record.analysis;
        let mut reasons = Vec::new();

        if a.sentiment_score <= p.negative_threshold {
            reasons.push(AlertReason::NegativeSentiment {
                score: a.sentiment_score,
                threshold: p.negative_threshold,
            });
        }
        if p.urgency_levels.contains(&a.urgency_level) {
            reasons.push(AlertReason::HighUrgency {
                urgency: a.urgency_level,
            });
        }
        if let Some((emotion, intensity)) = a.dominant_emotion() {
            if intensity >= p.emotion_threshold && p.alert_emotions.contains(&emotion) {
                reasons.push(AlertReason::IntenseEmotion { emotion, intensity });
            }
        }
        if a.sentiment_score < p.streak_threshold {
            let count = stored_streak + 1;
            if count >= p.consecutive_negative_limit {
                reasons.push(AlertReason::ConsecutiveNegative { count });
            }
        }
        reasons
    }

    /// Evaluate one analysis and append it to the customer's trend. The
    /// streak is read and extended atomically, so concurrent evaluations for
    /// one customer never share a count. Returns the alert raised, if any
    /// survived the cooldown filter.
    pub fn evaluate(&self, record: &SentimentAnalysisRecord, trend: &TrendStore) -> Option<SentimentAlert> {
        let streak = trend.record_and_count(
            &record.customer_id,
            TrendPoint::from(record),
            self.policy.streak_threshold,
        );
        let now = record.analyzed_at;

        let mut reasons = self.reasons(record, streak);
        if reasons.is_empty() {
            return None;
        }

        {
            let mut cooldowns = self.cooldowns.write().unwrap_or_else(|e| e.into_inner());
            let before = reasons.len();
            reasons.retain(|r| {
                let key = (record.customer_id.clone(), r.kind());
                match cooldowns.get(&key) {
                    Some(last) => now - *last >= self.policy.cooldown,
                    None => true,
                }
            });
            if reasons.len() < before {
                debug!(
                    customer = %record.customer_id,
                    suppressed = before - reasons.len(),
                    "alert reasons suppressed by cooldown"
                );
            }
            if reasons.is_empty() {
                return None;
            }
            let cooldown = self.policy.cooldown;
            cooldowns.retain(|_, last| now - *last < cooldown);
            for r in &reasons {
                cooldowns.insert((record.customer_id.clone(), r.kind()), now);
            }
        }

        let severity = severity(&reasons, record.analysis.sentiment_score);
        let alert = SentimentAlert {
            alert_id: Uuid::new_v4(),
            analysis_id: record.id,
            interaction_id: record.interaction_id.clone(),
            customer_id: record.customer_id.clone(),
            severity,
            reasons,
            status: AlertStatus::Active,
            created_at: now,
            updated_at: now,
            acknowledged_by: None,
            resolution_note: None,
        };

        if severity == AlertSeverity::Critical {
            warn!(
                alert_id = %alert.alert_id,
                customer = %alert.customer_id,
                reasons = alert.reasons.len(),
                "critical sentiment alert"
            );
        } else {
            info!(
                alert_id = %alert.alert_id,
                customer = %alert.customer_id,
                severity = ?alert.severity,
                reasons = alert.reasons.len(),
                "sentiment alert raised"
            );
        }

        self.alerts
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(alert.alert_id, alert.clone());
        Some(alert)
    }

    pub fn get(&self, alert_id: Uuid) -> Option<SentimentAlert> {
        self.alerts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&alert_id)
            .cloned()
    }

    /// Alerts not yet resolved or dismissed, oldest first.
    pub fn active(&self) -> Vec<SentimentAlert> {
        self.filtered(|a| !a.status.is_terminal())
    }

    pub fn for_customer(&self, customer_id: &str) -> Vec<SentimentAlert> {
        self.filtered(|a| a.customer_id == customer_id)
    }

    pub fn all(&self) -> Vec<SentimentAlert> {
        self.filtered(|_| true)
    }

    fn filtered(&self, keep: impl Fn(&SentimentAlert) -> bool) -> Vec<SentimentAlert> {
        self.alerts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|a| keep(a))
            .cloned()
            .collect()
    }

    pub fn acknowledge(&self, alert_id: Uuid, operator: &str) -> Result<SentimentAlert> {
        self.update(alert_id, |a| a.acknowledge(operator))
    }

    pub fn resolve(&self, alert_id: Uuid, note: &str) -> Result<SentimentAlert> {
        self.update(alert_id, |a| a.resolve(note))
    }

    pub fn mark_false_positive(&self, alert_id: Uuid, note: &str) -> Result<SentimentAlert> {
        self.update(alert_id, |a| a.mark_false_positive(note))
    }

    fn update(
        &self,
        alert_id: Uuid,
        apply: impl FnOnce(&mut SentimentAlert) -> Result<()>,
    ) -> Result<SentimentAlert> {
        let mut alerts = self.alerts.write().unwrap_or_else(|e| e.into_inner());
        let alert = alerts
            .get_mut(&alert_id)
            .ok_or_else(|| AnalyticsError::NotFound(format!("alert {alert_id}")))?;
        apply(alert)?;
        info!(alert_id = %alert_id, status = %alert.status, "alert updated");
        Ok(alert.clone())
    }
}

/// Critical for a negative streak or critical urgency; high for several
/// reasons, high urgency or a very low score; medium for plain negativity.
fn severity(reasons: &[AlertReason], score: f64) -> AlertSeverity {
    let critical = reasons.iter().any(|r| {
        matches!(
            r,
            AlertReason::ConsecutiveNegative { .. }
                | AlertReason::HighUrgency {
                    urgency: UrgencyLevel::Critical
                }
        )
    });
    if critical {
        return AlertSeverity::Critical;
    }
    let high_urgency = reasons
        .iter()
        .any(|r| matches!(r, AlertReason::HighUrgency { .. }));
    if reasons.len() >= 2 || high_urgency || score <= SEVERE_SCORE {
        AlertSeverity::High
    } else if reasons
        .iter()
        .any(|r| matches!(r, AlertReason::NegativeSentiment { .. }))
    {
        AlertSeverity::Medium
    } else {
        AlertSeverity::Low
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Duration;
    use indexmap::IndexMap;

    use super::*;
    use crate::language::Language;
    use crate::types::{
        ConfidenceLevel, Emotion, Intent, SentimentAnalysis, SentimentLevel,
    };

    fn record(customer: &str, score: f64, at: DateTime<Utc>) -> SentimentAnalysisRecord {
        SentimentAnalysisRecord {
            id: Uuid::new_v4(),
            interaction_id: format!("int-{}", at.timestamp_millis()),
            customer_id: customer.into(),
            language: Language::English,
            channel: None,
            analysis: SentimentAnalysis {
                overall_sentiment: SentimentLevel::from_score(score),
                sentiment_score: score,
                subjectivity: 0.5,
                confidence: ConfidenceLevel::Medium,
                scorer_scores: IndexMap::new(),
                emotion_scores: BTreeMap::new(),
                keywords: vec![],
                topics: vec![],
                intent: Intent::General,
                urgency_level: UrgencyLevel::Normal,
            },
            analyzed_at: at,
        }
    }

    fn feed(engine: &AlertEngine, trend: &TrendStore, r: &SentimentAnalysisRecord) -> Option<SentimentAlert> {
        engine.evaluate(r, trend)
    }

    #[test]
    fn third_consecutive_negative_is_critical() {
        let engine = AlertEngine::new(AlertPolicy::default());
        let trend = TrendStore::new(50);
        let t0 = Utc::now();
        assert!(feed(&engine, &trend, &record("c1", -0.3, t0)).is_none());
        assert!(feed(&engine, &trend, &record("c1", -0.35, t0 + Duration::minutes(1))).is_none());
        let alert = feed(&engine, &trend, &record("c1", -0.25, t0 + Duration::minutes(2))).unwrap();
        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert_eq!(alert.reasons, [AlertReason::ConsecutiveNegative { count: 3 }]);
    }

    #[test]
    fn positive_interaction_breaks_the_streak() {
        let engine = AlertEngine::new(AlertPolicy::default());
        let trend = TrendStore::new(50);
        let t0 = Utc::now();
        feed(&engine, &trend, &record("c1", -0.3, t0));
        feed(&engine, &trend, &record("c1", 0.4, t0 + Duration::minutes(1)));
        feed(&engine, &trend, &record("c1", -0.3, t0 + Duration::minutes(2)));
        assert!(feed(&engine, &trend, &record("c1", -0.3, t0 + Duration::minutes(3))).is_none());
        // Other customers have their own streaks.
        assert!(feed(&engine, &trend, &record("c2", -0.3, t0)).is_none());
    }

    #[test]
    fn negative_threshold_is_inclusive() {
        let engine = AlertEngine::new(AlertPolicy::default());
        let trend = TrendStore::new(50);
        let alert = engine.evaluate(&record("c1", -0.5, Utc::now()), &trend).unwrap();
        assert_eq!(alert.severity, AlertSeverity::Medium);
        assert_eq!(alert.reasons[0].kind(), AlertKind::NegativeSentiment);
    }

    #[test]
    fn cooldown_suppresses_same_kind() {
        let engine = AlertEngine::new(AlertPolicy::default());
        let trend = TrendStore::new(50);
        let t0 = Utc::now();
        assert!(engine.evaluate(&record("c1", -0.9, t0), &trend).is_some());
        assert!(engine.evaluate(&record("c1", -0.9, t0 + Duration::minutes(14)), &trend).is_none());
        assert!(engine.evaluate(&record("c2", -0.9, t0 + Duration::minutes(14)), &trend).is_some());
        assert!(engine.evaluate(&record("c1", -0.9, t0 + Duration::minutes(15)), &trend).is_some());
        assert_eq!(engine.for_customer("c1").len(), 2);
    }

    #[test]
    fn evaluation_records_the_trend() {
        let engine = AlertEngine::new(AlertPolicy::default());
        let trend = TrendStore::new(50);
        feed(&engine, &trend, &record("c1", 0.2, Utc::now()));
        assert_eq!(trend.points("c1").len(), 1);
    }

    #[test]
    fn concurrent_negatives_escalate_exactly_once() {
        let engine = AlertEngine::new(AlertPolicy::default());
        let trend = TrendStore::new(50);
        let t0 = Utc::now();
        let barrier = std::sync::Barrier::new(3);
        let alerts: Vec<Option<SentimentAlert>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..3)
                .map(|i| {
                    let (engine, trend, barrier) = (&engine, &trend, &barrier);
                    s.spawn(move || {
                        let r = record("c1", -0.3, t0 + Duration::seconds(i));
                        barrier.wait();
                        engine.evaluate(&r, trend)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let raised: Vec<&SentimentAlert> = alerts.iter().flatten().collect();
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].severity, AlertSeverity::Critical);
        assert_eq!(raised[0].reasons, [AlertReason::ConsecutiveNegative { count: 3 }]);
    }

    #[test]
    fn expired_cooldowns_are_pruned() {
        let engine = AlertEngine::new(AlertPolicy::default());
        let trend = TrendStore::new(50);
        let t0 = Utc::now();
        engine.evaluate(&record("c1", -0.9, t0), &trend).unwrap();
        engine.evaluate(&record("c2", -0.9, t0 + Duration::minutes(1)), &trend).unwrap();
        assert_eq!(engine.cooldowns.read().unwrap().len(), 2);

        engine.evaluate(&record("c3", -0.9, t0 + Duration::minutes(16)), &trend).unwrap();
        let cooldowns = engine.cooldowns.read().unwrap();
        assert_eq!(cooldowns.len(), 1);
        assert!(cooldowns.contains_key(&("c3".to_string(), AlertKind::NegativeSentiment)));
    }

    #[test]
    fn urgency_and_emotion_reasons() {
        let engine = AlertEngine::new(AlertPolicy::default());
        let trend = TrendStore::new(50);
        let mut r = record("c1", 0.0, Utc::now());
        r.analysis.urgency_level = UrgencyLevel::Critical;
        r.analysis.emotion_scores = [(Emotion::Fear, 0.75), (Emotion::Joy, 0.25)].into_iter().collect();
        let alert = engine.evaluate(&r, &trend).unwrap();
        assert_eq!(alert.severity, AlertSeverity::Critical);
        let kinds: Vec<AlertKind> = alert.reasons.iter().map(AlertReason::kind).collect();
        assert_eq!(kinds, [AlertKind::HighUrgency, AlertKind::IntenseEmotion]);

        let mut joyful = record("c2", 0.8, Utc::now());
        joyful.analysis.emotion_scores = [(Emotion::Joy, 1.0)].into_iter().collect();
        assert!(engine.evaluate(&joyful, &trend).is_none());
    }

    #[test]
    fn lifecycle_through_the_engine() {
        let engine = AlertEngine::new(AlertPolicy::default());
        let trend = TrendStore::new(50);
        let alert = engine.evaluate(&record("c1", -0.9, Utc::now()), &trend).unwrap();
        assert_eq!(alert.severity, AlertSeverity::High);
        assert_eq!(engine.active().len(), 1);

        engine.acknowledge(alert.alert_id, "ops").unwrap();
        assert!(engine.resolve(alert.alert_id, "").is_err());
        let resolved = engine.resolve(alert.alert_id, "refund approved").unwrap();
        assert_eq!(resolved.status, AlertStatus::Resolved);
        assert!(engine.active().is_empty());
        assert_eq!(engine.all().len(), 1);
        assert!(matches!(
            engine.acknowledge(Uuid::new_v4(), "ops"),
            Err(AnalyticsError::NotFound(_))
        ));
    }
}
