//! Valence-sum scorer with negation, boosters, capitalization, contrast and
//! punctuation emphasis, normalized with `s / sqrt(s² + α)`.

use super::{ScorerOutput, SentimentScorer};
use crate::lexicon::Lexicon;
use crate::preprocess::Preprocessed;

const NORMALIZATION_ALPHA: f64 = 15.0;
const NEGATION_SCALAR: f64 = -0.74;
const CAPS_INCREMENT: f64 = 0.733;
/// How many preceding tokens a negation or booster reaches.
const LOOKBACK: usize = 3;
const BOOSTER_DECAY: [f64; LOOKBACK] = [1.0, 0.95, 0.9];
const BEFORE_CONTRAST: f64 = 0.5;
const AFTER_CONTRAST: f64 = 1.5;
const EXCLAMATION_INCREMENT: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const QUESTION_INCREMENT: f64 = 0.18;
const MAX_QUESTION_EMPHASIS: f64 = 0.96;

#[derive(Debug, Clone, Default)]
pub struct RuleBasedScorer;

impl RuleBasedScorer {
    pub fn new() -> Self {
        Self
    }

    fn token_valence(&self, text: &Preprocessed, lexicon: &Lexicon, i: usize, mixed_case: bool) -> Option<f64> {
        let mut v = lexicon.valence(&text.tokens[i])?;
        // A negative-leaning token used as a booster or negation ("never") is
        // handled by the surrounding word instead.
        if lexicon.is_negation(&text.tokens[i]) {
            return None;
        }
        if mixed_case && text.shouted[i] {
            v += CAPS_INCREMENT * v.signum();
        }
        for (back, decay) in (1..=LOOKBACK).zip(BOOSTER_DECAY) {
            let Some(j) = i.checked_sub(back) else { break };
            if let Some(b) = lexicon.booster(&text.tokens[j]) {
                let mut boost = b * decay;
                if mixed_case && text.shouted[j] {
                    boost += CAPS_INCREMENT * b.signum();
                }
                v += boost * v.signum();
            }
        }
        let negated = (1..=LOOKBACK)
            .filter_map(|back| i.checked_sub(back))
            .any(|j| lexicon.is_negation(&text.tokens[j]));
        if negated {
            v *= NEGATION_SCALAR;
        }
        Some(v)
    }

    fn punctuation_emphasis(text: &Preprocessed) -> f64 {
        let excl = text.exclamations.min(MAX_EXCLAMATIONS) as f64 * EXCLAMATION_INCREMENT;
        let quest = if text.questions > 1 {
            (text.questions as f64 * QUESTION_INCREMENT).min(MAX_QUESTION_EMPHASIS)
        } else {
            0.0
        };
        excl + quest
    }
}

impl SentimentScorer for RuleBasedScorer {
    fn name(&self) -> &'static str {
        "rule_based"
    }

    fn score(&self, text: &Preprocessed, lexicon: &Lexicon) -> ScorerOutput {
        // Shouting only counts as emphasis when the rest of the text is not
        // also in capitals.
        let caps = text.caps_words();
        let mixed_case = caps > 0 && caps < text.tokens.len();
        let contrast = lexicon.contrast_index(text);

        let mut sum = 0.0;
        let mut hits = 0usize;
        for i in 0..text.tokens.len() {
            let Some(mut v) = self.token_valence(text, lexicon, i, mixed_case) else {
                continue;
            };
            if let Some(c) = contrast {
                if i < c {
                    v *= BEFORE_CONTRAST;
                } else if i > c {
                    v *= AFTER_CONTRAST;
                }
            }
            sum += v;
            hits += 1;
        }
        if hits == 0 {
            return ScorerOutput::polarity(0.0);
        }
        if sum != 0.0 {
            sum += Self::punctuation_emphasis(text) * sum.signum();
        }
        ScorerOutput::polarity(sum / (sum * sum + NORMALIZATION_ALPHA).sqrt())
    }
}
