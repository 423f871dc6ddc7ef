//! Polarity scorers. Each one maps a preprocessed text to a polarity in
//! `[-1, 1]`; the analyzer averages whichever ran.

mod naive_bayes;
mod pattern;
mod rule_based;

pub use naive_bayes::{NaiveBayesClassifier, TrainingLabel};
pub use pattern::PatternScorer;
pub use rule_based::RuleBasedScorer;

use crate::lexicon::Lexicon;
use crate::preprocess::Preprocessed;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScorerOutput {
    /// In `[-1, 1]`.
    pub polarity: f64,
    /// In `[0, 1]`, for scorers that estimate it.
    pub subjectivity: Option<f64>,
}

impl ScorerOutput {
    pub fn polarity(polarity: f64) -> Self {
        Self {
            polarity: polarity.clamp(-1.0, 1.0),
            subjectivity: None,
        }
    }
}

pub trait SentimentScorer: Send + Sync {
    fn name(&self) -> &'static str;

    fn score(&self, text: &Preprocessed, lexicon: &Lexicon) -> ScorerOutput;
}
