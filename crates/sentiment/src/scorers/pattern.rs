//! Averaging scorer: mean polarity of the opinion words, plus a
//! subjectivity estimate.

use super::{ScorerOutput, SentimentScorer};
use crate::lexicon::Lexicon;
use crate::preprocess::Preprocessed;

use spirit_rules::sentiment_lexicon::MAX_VALENCE;

const NEGATION_FACTOR: f64 = -0.5;
const BOOSTER_FACTOR: f64 = 1.0;
const BASE_SUBJECTIVITY: f64 = 0.4;
const SUBJECTIVITY_PER_VALENCE: f64 = 0.15;
const MARKER_SUBJECTIVITY: f64 = 0.7;

#[derive(Debug, Clone, Default)]
pub struct PatternScorer;

impl PatternScorer {
    pub fn new() -> Self {
        Self
    }
}

impl SentimentScorer for PatternScorer {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn score(&self, text: &Preprocessed, lexicon: &Lexicon) -> ScorerOutput {
        let mut polarities = Vec::new();
        let mut subjectivities = Vec::new();

        for (i, token) in text.tokens.iter().enumerate() {
            if lexicon.is_subjective_marker(token) {
                subjectivities.push(MARKER_SUBJECTIVITY);
                continue;
            }
            if lexicon.is_negation(token) {
                continue;
            }
            let Some(valence) = lexicon.valence(token) else {
                continue;
            };
            let mut polarity = valence / MAX_VALENCE;
            let mut subjectivity = BASE_SUBJECTIVITY + SUBJECTIVITY_PER_VALENCE * valence.abs();

            if let Some(prev) = i.checked_sub(1).map(|j| text.tokens[j].as_str()) {
                if let Some(b) = lexicon.booster(prev) {
                    polarity *= 1.0 + BOOSTER_FACTOR * b;
                    subjectivity *= 1.0 + BOOSTER_FACTOR * b;
                }
            }
            let negated = (1..=2)
                .filter_map(|back| i.checked_sub(back))
                .any(|j| lexicon.is_negation(&text.tokens[j]));
            if negated {
                polarity *= NEGATION_FACTOR;
            }
            polarities.push(polarity.clamp(-1.0, 1.0));
            subjectivities.push(subjectivity.min(1.0));
        }

        let polarity = mean(&polarities);
        let subjectivity = mean(&subjectivities);
        ScorerOutput {
            polarity: polarity.clamp(-1.0, 1.0),
            subjectivity: Some(subjectivity.clamp(0.0, 1.0)),
        }
    }
}

fn mean(v: &[f64]) -> f64 {
    if v.is_empty() {
        0.0
    } else {
        v.iter().sum::<f64>() / v.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::preprocess::preprocess;

    fn score(text: &str) -> ScorerOutput {
        PatternScorer::new().score(&preprocess(text), &Lexicon::builtin(Language::English))
    }

    #[test]
    fn averages_opinion_words() {
        let out = score("great views, bad lunch");
        let expected = (3.1 - 2.5) / 2.0 / MAX_VALENCE;
        assert!((out.polarity - expected).abs() < 1e-9);
    }

    #[test]
    fn negation_halves_and_flips() {
        let out = score("not good");
        assert!((out.polarity - (1.9 / MAX_VALENCE * NEGATION_FACTOR)).abs() < 1e-9);
    }

    #[test]
    fn factual_text_is_objective() {
        let out = score("Pickup is at 7am from the hotel lobby");
        assert_eq!(out.polarity, 0.0);
        assert_eq!(out.subjectivity, Some(0.0));
    }

    #[test]
    fn opinions_are_subjective() {
        let out = score("Honestly I think it was the best day of the trip");
        assert!(out.subjectivity.unwrap() > 0.6);
        assert!(out.polarity > 0.5);
    }
}
