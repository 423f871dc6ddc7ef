//! Common metadata shared across all rule kinds.

use serde::{Deserialize, Serialize};

/// Shared metadata for all rule kinds.
///
/// The `extends` field enables rule inheritance: a child rule references a parent
/// by ID and deep-merges the parent's fields, with the child's values winning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CommonMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Parent rule ID for inheritance.
    #[serde(default)]
    pub extends: Option<String>,
}

pub(crate) fn default_true() -> bool {
    true
}
