use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

/// What a forecast is predicting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionTarget {
    Demand,
    Revenue,
    Occupancy,
    Pricing,
}

impl PredictionTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionTarget::Demand => "demand",
            PredictionTarget::Revenue => "revenue",
            PredictionTarget::Occupancy => "occupancy",
            PredictionTarget::Pricing => "pricing",
        }
    }

    /// Unit label used in human-readable recommendations.
    pub fn unit(&self) -> &'static str {
        match self {
            PredictionTarget::Demand => "bookings",
            PredictionTarget::Revenue => "revenue",
            PredictionTarget::Occupancy => "occupancy",
            PredictionTarget::Pricing => "price",
        }
    }
}

impl fmt::Display for PredictionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PredictionTarget {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demand" => Ok(PredictionTarget::Demand),
            "revenue" => Ok(PredictionTarget::Revenue),
            "occupancy" => Ok(PredictionTarget::Occupancy),
            "pricing" | "price" => Ok(PredictionTarget::Pricing),
            other => Err(AnalyticsError::unknown("prediction target", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_targets() {
        assert_eq!("Demand".parse::<PredictionTarget>().unwrap(), PredictionTarget::Demand);
        assert_eq!(" revenue ".parse::<PredictionTarget>().unwrap(), PredictionTarget::Revenue);
        assert_eq!("price".parse::<PredictionTarget>().unwrap(), PredictionTarget::Pricing);
    }

    #[test]
    fn unknown_target_is_a_typed_error() {
        let err = "weather".parse::<PredictionTarget>().unwrap_err();
        assert_eq!(err, AnalyticsError::unknown("prediction target", "weather"));
    }
}
