//! SentimentLexicon rule kind: extra word valences and topic vocabulary.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::schema::CommonMetadata;

/// Valences use the same scale as the built-in lexicon.
pub const MAX_VALENCE: f64 = 4.0;

// ── YAML-level types ────────────────────────────────────────────────

/// Top-level SentimentLexicon rule document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SentimentLexiconRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub spec: SentimentLexiconSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SentimentLexiconSpec {
    /// ISO 639-1 code, e.g. `en` or `es`.
    pub language: String,
    /// Word (or short phrase) to valence in `[-4, 4]`.
    #[serde(default)]
    pub entries: BTreeMap<String, f64>,
    /// Topic name to trigger words.
    #[serde(default)]
    pub topics: BTreeMap<String, Vec<String>>,
}

// ── Compiled type ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledLexicon {
    pub language: String,
    pub entries: HashMap<String, f64>,
    pub topics: BTreeMap<String, Vec<String>>,
}

impl SentimentLexiconRule {
    pub fn compile(&self) -> Result<CompiledLexicon, String> {
        let language = self.spec.language.trim().to_ascii_lowercase();
        if language.len() != 2 || !language.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(format!("language '{}' is not a two-letter code", self.spec.language));
        }

        let mut entries = HashMap::with_capacity(self.spec.entries.len());
        for (word, &valence) in &self.spec.entries {
            if !valence.is_finite() || valence.abs() > MAX_VALENCE {
                return Err(format!("valence {valence} for '{word}' outside [-4, 4]"));
            }
            entries.insert(word.trim().to_lowercase(), valence);
        }

        let topics = self
            .spec
            .topics
            .iter()
            .map(|(topic, words)| {
                (
                    topic.trim().to_ascii_lowercase(),
                    words.iter().map(|w| w.trim().to_lowercase()).collect(),
                )
            })
            .collect();

        Ok(CompiledLexicon {
            language,
            entries,
            topics,
        })
    }
}
