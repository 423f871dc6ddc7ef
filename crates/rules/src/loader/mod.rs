//! Filesystem rule loader.
//!
//! Scans the rules directory for YAML files, resolves `extends` chains and
//! deserializes every document via the two-pass envelope path.

mod core;
mod error;
mod extends;

#[cfg(test)]
mod tests;

pub use self::core::RuleLoader;
pub use self::error::{LoadResult, LoadStatus, Result, RuleError};
pub use self::extends::{deep_merge, resolve_extends, resolve_one};
