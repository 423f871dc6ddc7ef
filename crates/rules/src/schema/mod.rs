//! YAML rule schema types with serde deserialization.
//!
//! Defines the type hierarchy for rule documents:
//! - `RuleEnvelope`: lightweight first-pass header (apiVersion, kind, metadata)
//! - `RuleDocument`: enum dispatching to kind-specific types
//! - `RuleKind`: the supported `kind:` values
//!
//! The kind-specific types live in their own modules at the crate root
//! (`alert_policy`, `forecast_profile`, `sentiment_lexicon`).

mod document;
mod envelope;
mod kind;
mod metadata;

pub use document::*;
pub use envelope::*;
pub use kind::*;
pub use metadata::*;

/// The only `apiVersion` currently understood.
pub const API_VERSION: &str = "v1";
