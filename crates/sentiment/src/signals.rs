//! Non-polarity signals: emotions, keywords, topics, intent and urgency.

use std::collections::BTreeMap;

use crate::lexicon::Lexicon;
use crate::preprocess::Preprocessed;
use crate::types::{Emotion, Intent, UrgencyLevel};

/// Shouted emotion words count this much more.
const SHOUT_WEIGHT: f64 = 1.5;
/// Emotion scores are normalized by at least this many hits, so a single
/// keyword cannot dominate.
const MIN_EMOTION_MASS: f64 = 2.0;
const MAX_KEYWORDS: usize = 10;
const SHOUTING_WORDS: usize = 2;
const EXCLAMATION_BURST: usize = 3;
const DENSE_PUNCTUATION: f64 = 0.25;
const NEGATIVE_SCORE: f64 = -0.2;

/// Weighted occurrences of `term` (a word or phrase).
fn term_weight(text: &Preprocessed, term: &str) -> f64 {
    if term.contains(' ') {
        return if text.contains_phrase(term) { 1.0 } else { 0.0 };
    }
    text.tokens
        .iter()
        .zip(&text.shouted)
        .filter(|(t, _)| *t == term)
        .map(|(_, &shouted)| if shouted { SHOUT_WEIGHT } else { 1.0 })
        .sum()
}

fn any_term(text: &Preprocessed, terms: &[String]) -> bool {
    terms.iter().any(|t| text.contains_phrase(t))
}

/// Per-emotion scores, non-negative and summing to at most 1. Emotions with
/// no evidence are omitted.
pub fn emotion_scores(text: &Preprocessed, lexicon: &Lexicon) -> BTreeMap<Emotion, f64> {
    let raw: Vec<(Emotion, f64)> = lexicon
        .emotions()
        .iter()
        .map(|(emotion, terms)| (*emotion, terms.iter().map(|t| term_weight(text, t)).sum()))
        .filter(|(_, w)| *w > 0.0)
        .collect();
    let mass = raw.iter().map(|(_, w)| w).sum::<f64>().max(MIN_EMOTION_MASS);
    raw.into_iter().map(|(e, w)| (e, w / mass)).collect()
}

/// Opinion words and domain terms in order of first appearance.
pub fn keywords(text: &Preprocessed, lexicon: &Lexicon) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in &text.tokens {
        if out.len() == MAX_KEYWORDS {
            break;
        }
        let relevant = token.chars().count() > 2
            && (lexicon.valence(token).is_some() || lexicon.is_topic_term(token));
        if relevant && !out.contains(token) {
            out.push(token.clone());
        }
    }
    out
}

pub fn topics(text: &Preprocessed, lexicon: &Lexicon) -> Vec<String> {
    lexicon
        .topics()
        .iter()
        .filter(|(_, terms)| any_term(text, terms))
        .map(|(topic, _)| topic.clone())
        .collect()
}

/// First matching intent in priority order. Single interrogative words only
/// count when the text actually asks something.
pub fn intent(text: &Preprocessed, lexicon: &Lexicon) -> Intent {
    for (intent, terms) in lexicon.intents() {
        let matched = match intent {
            Intent::Inquiry => {
                (text.questions > 0 && any_term(text, terms))
                    || terms.iter().any(|t| t.contains(' ') && text.contains_phrase(t))
            }
            _ => any_term(text, terms),
        };
        if matched {
            return *intent;
        }
    }
    if text.questions > 0 {
        Intent::Inquiry
    } else {
        Intent::General
    }
}

pub fn urgency(text: &Preprocessed, lexicon: &Lexicon, score: f64) -> UrgencyLevel {
    if any_term(text, lexicon.critical_terms()) {
        return UrgencyLevel::Critical;
    }
    let high_terms = lexicon
        .high_terms()
        .iter()
        .filter(|t| text.contains_phrase(t))
        .count()
        .min(2);
    let shouting = usize::from(text.caps_words() >= SHOUTING_WORDS);
    let punctuation = usize::from(
        text.exclamations >= EXCLAMATION_BURST || text.punctuation_density() > DENSE_PUNCTUATION,
    );
    match high_terms + shouting + punctuation {
        0 if score < NEGATIVE_SCORE => UrgencyLevel::Normal,
        0 => UrgencyLevel::Low,
        1 => UrgencyLevel::Normal,
        _ => UrgencyLevel::High,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::preprocess::preprocess;

    fn en() -> Lexicon {
        Lexicon::builtin(Language::English)
    }

    #[test]
    fn emotions_sum_to_at_most_one() {
        let p = preprocess("I am so angry and frustrated, still waiting, this is ridiculous and I feel unsafe");
        let scores = emotion_scores(&p, &en());
        let total: f64 = scores.values().sum();
        assert!(total <= 1.0 + 1e-9);
        assert!(scores.values().all(|v| *v >= 0.0));
        assert!(scores[&Emotion::Frustration] > scores[&Emotion::Fear]);
    }

    #[test]
    fn single_emotion_word_is_capped() {
        let scores = emotion_scores(&preprocess("I'm angry"), &en());
        assert_eq!(scores[&Emotion::Anger], 0.5);
        assert!(emotion_scores(&preprocess("pickup at 7"), &en()).is_empty());
    }

    #[test]
    fn keywords_and_topics() {
        let p = preprocess("The guide was amazing but the bus was late and the lunch was cold");
        assert_eq!(keywords(&p, &en()), ["guide", "amazing", "bus", "late", "lunch"]);
        assert_eq!(topics(&p, &en()), ["food", "guide", "transport"]);
    }

    #[test]
    fn intent_priority() {
        let lex = en();
        assert_eq!(intent(&preprocess("I want a refund, this is unacceptable. How do I complain?"), &lex), Intent::Complaint);
        assert_eq!(intent(&preprocess("What time is pickup?"), &lex), Intent::Inquiry);
        assert_eq!(intent(&preprocess("What an excellent day, thank you"), &lex), Intent::Compliment);
        assert_eq!(intent(&preprocess("You should try the night tour"), &lex), Intent::Recommendation);
        assert_eq!(intent(&preprocess("We arrived on Tuesday"), &lex), Intent::General);
    }

    #[test]
    fn urgency_levels() {
        let lex = en();
        assert_eq!(urgency(&preprocess("We are stranded at the airport"), &lex, -0.4), UrgencyLevel::Critical);
        assert_eq!(urgency(&preprocess("I want a REFUND NOW!!!"), &lex, -0.3), UrgencyLevel::High);
        assert_eq!(urgency(&preprocess("Please cancel my booking"), &lex, 0.0), UrgencyLevel::Normal);
        assert_eq!(urgency(&preprocess("Lovely day"), &lex, 0.6), UrgencyLevel::Low);
        assert_eq!(urgency(&preprocess("Quite a boring tour"), &lex, -0.3), UrgencyLevel::Normal);
    }
}
