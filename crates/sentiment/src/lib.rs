//! Customer sentiment analysis and alerting.
//!
//! This crate provides:
//! - `SentimentAnalyzer`: preprocessing, up to three polarity scorers,
//!   emotion/intent/urgency signals
//! - `AlertEngine`: threshold policy, cooldowns, consecutive-negative
//!   escalation and the alert lifecycle
//! - `RealtimeDispatcher`: `sentiment_update` fan-out and per-customer trends
//! - `SentimentService`: the three wired together

pub mod alerts;
pub mod analyzer;
pub mod language;
pub mod lexicon;
pub mod preprocess;
pub mod realtime;
pub mod scorers;
pub mod service;
pub mod signals;
pub mod trend;
pub mod types;

pub use alerts::{AlertEngine, AlertPolicy, AlertSeverity, AlertStatus, SentimentAlert};
pub use analyzer::SentimentAnalyzer;
pub use language::Language;
pub use realtime::{RealtimeDispatcher, SentimentUpdate};
pub use service::{InteractionOutcome, SentimentService};
pub use trend::{TrendStore, TrendSummary};
pub use types::{
    ConfidenceLevel, Emotion, Intent, Interaction, SentimentAnalysis, SentimentAnalysisRecord,
    SentimentLevel, UrgencyLevel,
};
