//! End-to-end handling of one customer interaction: analyze, evaluate
//! alerts, dispatch live updates.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use spirit_core::config::SentimentConfig;
use spirit_core::{Config, Result};
use spirit_notify::SubscriberRegistry;
use spirit_rules::RuleLoader;

use crate::alerts::{AlertEngine, AlertPolicy, SentimentAlert};
use crate::analyzer::SentimentAnalyzer;
use crate::realtime::{DispatchReport, RealtimeDispatcher};
use crate::trend::{TrendStore, TrendSummary};
use crate::types::{Interaction, SentimentAnalysisRecord};

#[derive(Debug, Clone, Serialize)]
pub struct InteractionOutcome {
    pub record: SentimentAnalysisRecord,
    pub alert: Option<SentimentAlert>,
    pub delivery: DispatchReport,
}

pub struct SentimentService {
    analyzer: SentimentAnalyzer,
    engine: AlertEngine,
    dispatcher: RealtimeDispatcher,
    records: RwLock<Vec<SentimentAnalysisRecord>>,
}

impl SentimentService {
    pub fn new(
        analyzer: SentimentAnalyzer,
        policy: AlertPolicy,
        config: &SentimentConfig,
        registry: Arc<SubscriberRegistry>,
    ) -> Self {
        Self {
            analyzer,
            engine: AlertEngine::new(policy),
            dispatcher: RealtimeDispatcher::new(registry, TrendStore::new(config.trend_window)),
            records: RwLock::new(Vec::new()),
        }
    }

    /// Built-in lexicons and the policy from `config`, with a fresh registry.
    pub fn from_config(config: &Config) -> Self {
        let registry = Arc::new(SubscriberRegistry::new(Duration::from_secs(
            config.realtime.heartbeat_ttl_secs.max(0) as u64,
        )));
        Self::new(
            SentimentAnalyzer::new(),
            AlertPolicy::from_config(&config.sentiment),
            &config.sentiment,
            registry,
        )
    }

    /// Like [`from_config`](Self::from_config), but custom lexicons and the
    /// alert policy come from loaded rules when present.
    pub fn from_rules(config: &Config, loader: &RuleLoader) -> Result<Self> {
        let mut service = Self::from_config(config);
        let lexicons = loader.lexicons();
        if !lexicons.is_empty() {
            service.analyzer = service.analyzer.with_lexicons(&lexicons)?;
        }
        if let Some(rule) = loader.alert_policy() {
            let policy = AlertPolicy::try_from(&rule)?;
            info!(
                negative_threshold = policy.negative_threshold,
                cooldown_minutes = policy.cooldown.num_minutes(),
                "alert policy loaded from rules"
            );
            service.engine = AlertEngine::new(policy);
        }
        Ok(service)
    }

    pub fn analyzer(&self) -> &SentimentAnalyzer {
        &self.analyzer
    }

    pub fn alerts(&self) -> &AlertEngine {
        &self.engine
    }

    pub fn dispatcher(&self) -> &RealtimeDispatcher {
        &self.dispatcher
    }

    /// Analyze `interaction`, extend the customer's trend while raising any
    /// alert, then push the update. Delivery problems never fail the call.
    pub async fn process(&self, interaction: &Interaction) -> Result<InteractionOutcome> {
        let record = self.analyzer.analyze_interaction(interaction)?;
        let alert = self.engine.evaluate(&record, self.dispatcher.trend());

        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());

        let delivery = match self.dispatcher.publish(&record, alert.as_ref()).await {
            Ok(report) => report,
            Err(e) => {
                warn!(interaction = %record.interaction_id, error = %e, "sentiment update not sent");
                DispatchReport::default()
            }
        };

        info!(
            interaction = %record.interaction_id,
            customer = %record.customer_id,
            level = %record.analysis.overall_sentiment,
            alert = alert.is_some(),
            "interaction processed"
        );
        Ok(InteractionOutcome {
            record,
            alert,
            delivery,
        })
    }

    /// Every stored analysis, oldest first.
    pub fn records(&self) -> Vec<SentimentAnalysisRecord> {
        self.records.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn records_for_customer(&self, customer_id: &str) -> Vec<SentimentAnalysisRecord> {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.customer_id == customer_id)
            .cloned()
            .collect()
    }

    pub fn trend_summary(&self, customer_id: &str) -> Option<TrendSummary> {
        self.dispatcher.trend().summary(customer_id)
    }
}
