//! Categorical outputs of sentiment analysis and their parsing.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spirit_core::AnalyticsError;

/// Declares a snake_case enum with `as_str`, `Display` and a validated
/// `FromStr` that accepts extra aliases.
macro_rules! category {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($variant:ident => $text:literal $(| $alias:literal)*),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = AnalyticsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
                match normalized.as_str() {
                    $($text $(| $alias)* => Ok($name::$variant),)+
                    _ => Err(AnalyticsError::unknown($label, s)),
                }
            }
        }
    };
}

category! {
    /// Five-level sentiment bucket.
    SentimentLevel, "sentiment level" {
        VeryNegative => "very_negative",
        Negative => "negative",
        Neutral => "neutral",
        Positive => "positive",
        VeryPositive => "very_positive",
    }
}

impl SentimentLevel {
    /// Bucket a polarity in `[-1, 1]`. Lower bounds are inclusive:
    /// `[-1, -0.6)`, `[-0.6, -0.2)`, `[-0.2, 0.2)`, `[0.2, 0.6)`, `[0.6, 1]`.
    pub fn from_score(score: f64) -> Self {
        if score < -0.6 {
            SentimentLevel::VeryNegative
        } else if score < -0.2 {
            SentimentLevel::Negative
        } else if score < 0.2 {
            SentimentLevel::Neutral
        } else if score < 0.6 {
            SentimentLevel::Positive
        } else {
            SentimentLevel::VeryPositive
        }
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, SentimentLevel::VeryNegative | SentimentLevel::Negative)
    }
}

category! {
    /// How much the scorers agree.
    ConfidenceLevel, "confidence level" {
        VeryLow => "very_low",
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

impl ConfidenceLevel {
    /// One level lower, saturating at `VeryLow`.
    pub fn demote(self) -> Self {
        match self {
            ConfidenceLevel::High => ConfidenceLevel::Medium,
            ConfidenceLevel::Medium => ConfidenceLevel::Low,
            ConfidenceLevel::Low | ConfidenceLevel::VeryLow => ConfidenceLevel::VeryLow,
        }
    }
}

category! {
    Emotion, "emotion" {
        Joy => "joy" | "happiness",
        Anger => "anger" | "angry",
        Fear => "fear",
        Sadness => "sadness" | "sad",
        Surprise => "surprise",
        Disgust => "disgust",
        Frustration => "frustration",
    }
}

category! {
    Intent, "intent" {
        Complaint => "complaint",
        Inquiry => "inquiry" | "question",
        Compliment => "compliment",
        Recommendation => "recommendation",
        General => "general",
    }
}

category! {
    UrgencyLevel, "urgency level" {
        Low => "low",
        Normal => "normal" | "medium",
        High => "high",
        Critical => "critical" | "urgent",
    }
}

/// Text plus the identifiers of the interaction it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub interaction_id: String,
    pub customer_id: String,
    pub text: String,
    pub language: crate::Language,
    /// Source channel, e.g. `chat`, `email`, `review`.
    #[serde(default)]
    pub channel: Option<String>,
}

/// Everything the analyzer derives from one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub overall_sentiment: SentimentLevel,
    /// Mean of the scorer polarities, in `[-1, 1]`.
    pub sentiment_score: f64,
    /// `0` is objective, `1` fully subjective.
    pub subjectivity: f64,
    pub confidence: ConfidenceLevel,
    /// Polarity reported by each scorer that ran, by scorer name.
    pub scorer_scores: IndexMap<String, f64>,
    /// Non-negative, summing to at most 1.
    pub emotion_scores: BTreeMap<Emotion, f64>,
    pub keywords: Vec<String>,
    pub topics: Vec<String>,
    pub intent: Intent,
    pub urgency_level: UrgencyLevel,
}

impl SentimentAnalysis {
    /// Strongest emotion, if any scored above zero.
    pub fn dominant_emotion(&self) -> Option<(Emotion, f64)> {
        self.emotion_scores
            .iter()
            .filter(|(_, &v)| v > 0.0)
            .fold(None, |best: Option<(Emotion, f64)>, (&e, &v)| match best {
                Some((_, b)) if b >= v => best,
                _ => Some((e, v)),
            })
    }
}

/// Persisted analysis of one interaction. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysisRecord {
    pub id: Uuid,
    pub interaction_id: String,
    pub customer_id: String,
    pub language: crate::Language,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(flatten)]
    pub analysis: SentimentAnalysis,
    pub analyzed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_are_total_and_non_overlapping() {
        let mut last = SentimentLevel::VeryNegative;
        for i in 0..=2000 {
            let score = -1.0 + i as f64 / 1000.0;
            let level = SentimentLevel::from_score(score);
            assert!(level >= last, "buckets must be monotone at {score}");
            last = level;
        }
        assert_eq!(SentimentLevel::from_score(-0.6), SentimentLevel::Negative);
        assert_eq!(SentimentLevel::from_score(-0.2), SentimentLevel::Neutral);
        assert_eq!(SentimentLevel::from_score(0.2), SentimentLevel::Positive);
        assert_eq!(SentimentLevel::from_score(0.6), SentimentLevel::VeryPositive);
        assert_eq!(SentimentLevel::from_score(-0.61), SentimentLevel::VeryNegative);
    }

    #[test]
    fn parsing_is_validated() {
        assert_eq!("Very Negative".parse::<SentimentLevel>().unwrap(), SentimentLevel::VeryNegative);
        assert_eq!("urgent".parse::<UrgencyLevel>().unwrap(), UrgencyLevel::Critical);
        assert_eq!("ANGER".parse::<Emotion>().unwrap(), Emotion::Anger);
        let err = "ecstatic".parse::<Emotion>().unwrap_err();
        assert!(matches!(err, AnalyticsError::UnknownCategory { kind: "emotion", .. }));
    }

    #[test]
    fn confidence_demotion_saturates() {
        assert_eq!(ConfidenceLevel::High.demote(), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::VeryLow.demote(), ConfidenceLevel::VeryLow);
    }

    #[test]
    fn serde_uses_snake_case() {
        assert_eq!(serde_json::to_string(&SentimentLevel::VeryPositive).unwrap(), "\"very_positive\"");
        assert_eq!(serde_json::to_string(&UrgencyLevel::Critical).unwrap(), "\"critical\"");
    }
}
