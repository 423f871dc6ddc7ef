//! YAML rule documents that tune the analytics core.
//!
//! This crate provides:
//! - YAML-based rule definitions with serde deserialization
//! - Two-pass loading (envelope first, then the kind-specific type)
//! - A filesystem loader with `extends` inheritance
//! - Rule kinds: `AlertPolicy`, `ForecastProfile`, `SentimentLexicon`

pub mod alert_policy;
pub mod forecast_profile;
pub mod loader;
pub mod schema;
pub mod sentiment_lexicon;

pub use loader::{LoadResult, LoadStatus, RuleError, RuleLoader};
pub use schema::{CommonMetadata, RuleDocument, RuleEnvelope, RuleKind};
