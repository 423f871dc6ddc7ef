//! Text cleanup shared by every scorer.

use std::sync::LazyLock;

use regex::Regex;

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:https?://|www\.)\S+").expect("static regex"));
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[\w.+-]+@[\w-]+\.[\w.-]+\b").expect("static regex"));
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+?\d[\d\s().-]{7,}\d").expect("static regex")
});
static REPEATED_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([!?.])[!?.]{2,}").expect("static regex"));
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}']+").expect("static regex"));

/// A cleaned text plus the surface signals that cleaning would otherwise
/// erase (capitalization and punctuation).
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessed {
    /// URLs, emails and phone numbers removed; whitespace collapsed; case kept.
    pub text: String,
    /// Lowercased words in order.
    pub tokens: Vec<String>,
    /// Per token: whether it was written in ALL CAPS (two letters or more).
    pub shouted: Vec<bool>,
    pub exclamations: usize,
    pub questions: usize,
}

impl Preprocessed {
    pub fn caps_words(&self) -> usize {
        self.shouted.iter().filter(|s| **s).count()
    }

    /// `!` and `?` per word.
    pub fn punctuation_density(&self) -> f64 {
        if self.tokens.is_empty() {
            0.0
        } else {
            (self.exclamations + self.questions) as f64 / self.tokens.len() as f64
        }
    }

    /// Lowercased cleaned text, for phrase lookups.
    pub fn lower(&self) -> String {
        self.text.to_lowercase()
    }

    /// Whether `phrase` (one or more words) occurs on word boundaries.
    pub fn contains_phrase(&self, phrase: &str) -> bool {
        let words: Vec<&str> = phrase.split_whitespace().collect();
        match words.len() {
            0 => false,
            1 => self.tokens.iter().any(|t| t == words[0]),
            n => self
                .tokens
                .windows(n)
                .any(|w| w.iter().zip(&words).all(|(a, b)| a == b)),
        }
    }
}

pub fn preprocess(raw: &str) -> Preprocessed {
    let text = URL.replace_all(raw, " ");
    let text = EMAIL.replace_all(&text, " ");
    let text = PHONE.replace_all(&text, " ");
    // Signals are counted before collapsing "!!!" so emphasis is preserved.
    let exclamations = text.matches('!').count();
    let questions = text.matches('?').count();
    let text = REPEATED_PUNCT.replace_all(&text, "$1");
    let text = text
        .replace(['\u{2019}', '\u{2018}'], "'")
        .replace(['\u{201c}', '\u{201d}'], "\"");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut tokens = Vec::new();
    let mut shouted = Vec::new();
    for m in WORD.find_iter(&text) {
        let word = m.as_str();
        let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
        shouted.push(letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase()));
        tokens.push(word.to_lowercase());
    }

    Preprocessed {
        text,
        tokens,
        shouted,
        exclamations,
        questions,
    }
}
