//! Rule kind enum for two-pass deserialization dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported rule kinds for two-pass deserialization dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    AlertPolicy,
    ForecastProfile,
    SentimentLexicon,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::AlertPolicy => write!(f, "AlertPolicy"),
            RuleKind::ForecastProfile => write!(f, "ForecastProfile"),
            RuleKind::SentimentLexicon => write!(f, "SentimentLexicon"),
        }
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "AlertPolicy" => Ok(RuleKind::AlertPolicy),
            "ForecastProfile" => Ok(RuleKind::ForecastProfile),
            "SentimentLexicon" => Ok(RuleKind::SentimentLexicon),
            other => Err(format!("unknown rule kind: '{}'", other)),
        }
    }
}
