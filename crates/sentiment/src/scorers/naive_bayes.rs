//! Multinomial naive Bayes over unigrams with Laplace smoothing. Trained on
//! labeled texts; reports `P(positive) - P(negative)` as its polarity.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use spirit_core::{AnalyticsError, Result};

use super::{ScorerOutput, SentimentScorer};
use crate::lexicon::Lexicon;
use crate::preprocess::{preprocess, Preprocessed};

const SMOOTHING: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingLabel {
    Negative,
    Neutral,
    Positive,
}

impl TrainingLabel {
    const ALL: [TrainingLabel; 3] = [
        TrainingLabel::Negative,
        TrainingLabel::Neutral,
        TrainingLabel::Positive,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// One labeled example, as stored in training files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSample {
    pub text: String,
    pub label: TrainingLabel,
}

#[derive(Debug, Clone)]
pub struct NaiveBayesClassifier {
    doc_counts: [usize; 3],
    token_totals: [usize; 3],
    token_counts: HashMap<String, [usize; 3]>,
}

impl NaiveBayesClassifier {
    /// Fit on `samples`. Both the positive and negative class need at least
    /// one example.
    pub fn train<'a>(samples: impl IntoIterator<Item = (&'a str, TrainingLabel)>) -> Result<Self> {
        let mut model = Self {
            doc_counts: [0; 3],
            token_totals: [0; 3],
            token_counts: HashMap::new(),
        };
        for (text, label) in samples {
            let k = label.index();
            model.doc_counts[k] += 1;
            for token in preprocess(text).tokens {
                model.token_counts.entry(token).or_insert([0; 3])[k] += 1;
                model.token_totals[k] += 1;
            }
        }
        if model.doc_counts[TrainingLabel::Positive.index()] == 0
            || model.doc_counts[TrainingLabel::Negative.index()] == 0
        {
            return Err(AnalyticsError::DataInsufficiency(
                "classifier needs positive and negative examples".into(),
            ));
        }
        debug!(
            documents = model.doc_counts.iter().sum::<usize>(),
            vocabulary = model.token_counts.len(),
            "naive bayes classifier trained"
        );
        Ok(model)
    }

    pub fn from_samples(samples: &[TrainingSample]) -> Result<Self> {
        Self::train(samples.iter().map(|s| (s.text.as_str(), s.label)))
    }

    pub fn vocabulary_size(&self) -> usize {
        self.token_counts.len()
    }

    /// Posterior over the three labels, in `TrainingLabel::ALL` order.
    pub fn posterior(&self, tokens: &[String]) -> [f64; 3] {
        let docs: usize = self.doc_counts.iter().sum();
        let vocab = self.token_counts.len() as f64;
        let mut log_p = [f64::NEG_INFINITY; 3];
        for label in TrainingLabel::ALL {
            let k = label.index();
            if self.doc_counts[k] == 0 {
                continue;
            }
            let mut lp = (self.doc_counts[k] as f64 / docs as f64).ln();
            let denom = self.token_totals[k] as f64 + SMOOTHING * vocab;
            for token in tokens {
                // Tokens never seen in training carry no evidence.
                if let Some(counts) = self.token_counts.get(token) {
                    lp += ((counts[k] as f64 + SMOOTHING) / denom).ln();
                }
            }
            log_p[k] = lp;
        }
        let max = log_p.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = log_p.iter().map(|lp| (lp - max).exp()).collect();
        let total: f64 = exp.iter().sum();
        [exp[0] / total, exp[1] / total, exp[2] / total]
    }

    pub fn predict(&self, text: &str) -> TrainingLabel {
        let p = self.posterior(&preprocess(text).tokens);
        let best = (0..3).fold(0, |b, k| if p[k] > p[b] { k } else { b });
        TrainingLabel::ALL[best]
    }
}

impl SentimentScorer for NaiveBayesClassifier {
    fn name(&self) -> &'static str {
        "classifier"
    }

    fn score(&self, text: &Preprocessed, _lexicon: &Lexicon) -> ScorerOutput {
        let p = self.posterior(&text.tokens);
        ScorerOutput::polarity(
            p[TrainingLabel::Positive.index()] - p[TrainingLabel::Negative.index()],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;

    fn corpus() -> Vec<(&'static str, TrainingLabel)> {
        use TrainingLabel::*;
        vec![
            ("loved the tour, amazing guide", Positive),
            ("great trip, wonderful views", Positive),
            ("the guide was fantastic and funny", Positive),
            ("terrible bus, rude driver", Negative),
            ("awful food and dirty room", Negative),
            ("waited two hours, worst service", Negative),
            ("pickup is at seven", Neutral),
            ("the tour lasts four hours", Neutral),
        ]
    }

    #[test]
    fn learns_the_corpus() {
        let nb = NaiveBayesClassifier::train(corpus()).unwrap();
        assert_eq!(nb.predict("amazing guide and wonderful views"), TrainingLabel::Positive);
        assert_eq!(nb.predict("rude driver and dirty bus"), TrainingLabel::Negative);
        let p = nb.posterior(&preprocess("loved it").tokens);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn polarity_is_probability_difference() {
        let nb = NaiveBayesClassifier::train(corpus()).unwrap();
        let lex = Lexicon::builtin(Language::English);
        let out = nb.score(&preprocess("worst service, terrible driver"), &lex);
        assert!(out.polarity < -0.5 && out.polarity >= -1.0);
        assert!(out.subjectivity.is_none());
    }

    #[test]
    fn unseen_tokens_fall_back_to_priors() {
        let nb = NaiveBayesClassifier::train(corpus()).unwrap();
        let p = nb.posterior(&["zzz".to_string()]);
        assert!((p[0] - 3.0 / 8.0).abs() < 1e-9);
        assert!((p[2] - 3.0 / 8.0).abs() < 1e-9);
    }

    #[test]
    fn one_sided_corpus_is_rejected() {
        let only_positive = vec![("great", TrainingLabel::Positive)];
        assert!(matches!(
            NaiveBayesClassifier::train(only_positive),
            Err(AnalyticsError::DataInsufficiency(_))
        ));
    }
}
