//! Domain vocabulary for each supported language.
//!
//! Valences use the `[-4, 4]` scale of the rule-based scorer; the pattern
//! scorer rescales them to `[-1, 1]`.

use std::collections::{BTreeMap, HashMap, HashSet};

use spirit_core::{AnalyticsError, Result};
use spirit_rules::sentiment_lexicon::CompiledLexicon;

use crate::language::Language;
use crate::preprocess::Preprocessed;
use crate::types::{Emotion, Intent};

// ── English ───────────────────────────────────────────────────

const EN_VALENCE: &[(&str, f64)] = &[
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("beautiful", 2.9),
    ("best", 3.2),
    ("comfortable", 1.8),
    ("delicious", 2.7),
    ("enjoyed", 2.3),
    ("excellent", 3.2),
    ("fantastic", 3.0),
    ("friendly", 2.2),
    ("fun", 2.3),
    ("good", 1.9),
    ("great", 3.1),
    ("happy", 2.7),
    ("helpful", 1.9),
    ("incredible", 2.9),
    ("love", 3.2),
    ("loved", 2.9),
    ("nice", 1.8),
    ("perfect", 2.7),
    ("pleasant", 2.3),
    ("recommend", 1.5),
    ("thanks", 1.9),
    ("thank", 1.5),
    ("wonderful", 2.7),
    ("angry", -2.3),
    ("annoyed", -1.6),
    ("awful", -2.0),
    ("bad", -2.5),
    ("boring", -1.3),
    ("broken", -1.9),
    ("delay", -1.3),
    ("delayed", -1.5),
    ("dirty", -1.9),
    ("disappointed", -2.1),
    ("disappointing", -2.2),
    ("disgusting", -2.4),
    ("frustrated", -2.4),
    ("frustrating", -2.4),
    ("hate", -2.7),
    ("horrible", -2.5),
    ("late", -1.2),
    ("lost", -1.3),
    ("never", -0.5),
    ("poor", -2.1),
    ("problem", -1.7),
    ("rude", -2.0),
    ("scared", -1.9),
    ("terrible", -2.1),
    ("unacceptable", -2.6),
    ("unsafe", -2.4),
    ("upset", -1.6),
    ("waste", -1.8),
    ("worst", -3.1),
    ("wrong", -2.1),
];

const EN_NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nobody", "nothing", "neither", "nor", "without", "isn't",
    "wasn't", "aren't", "weren't", "don't", "doesn't", "didn't", "can't", "cannot", "couldn't",
    "won't", "wouldn't", "shouldn't", "hardly",
];

const EN_BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", 0.293),
    ("extremely", 0.293),
    ("incredibly", 0.293),
    ("really", 0.293),
    ("so", 0.293),
    ("totally", 0.293),
    ("very", 0.293),
    ("completely", 0.293),
    ("slightly", -0.293),
    ("somewhat", -0.293),
    ("barely", -0.293),
    ("kind", -0.293),
];

const EN_CONTRAST: &[&str] = &["but", "however", "although"];

const EN_EMOTIONS: &[(Emotion, &[&str])] = &[
    (Emotion::Joy, &["happy", "love", "loved", "enjoyed", "amazing", "wonderful", "delighted", "fun"]),
    (Emotion::Anger, &["angry", "furious", "outraged", "hate", "unacceptable", "rude", "ridiculous"]),
    (Emotion::Fear, &["scared", "afraid", "worried", "unsafe", "dangerous", "nervous", "stranded"]),
    (Emotion::Sadness, &["sad", "disappointed", "disappointing", "unhappy", "miss", "regret"]),
    (Emotion::Surprise, &["surprised", "unexpected", "wow", "shocked", "incredible"]),
    (Emotion::Disgust, &["disgusting", "dirty", "gross", "filthy", "smelly"]),
    (Emotion::Frustration, &["frustrated", "frustrating", "waiting", "again", "still", "delayed", "annoyed"]),
];

const EN_TOPICS: &[(&str, &[&str])] = &[
    ("booking", &["booking", "reservation", "booked", "confirmation", "ticket"]),
    ("pricing", &["price", "cost", "expensive", "cheap", "refund", "charge", "charged", "money"]),
    ("guide", &["guide", "tour guide", "instructor"]),
    ("transport", &["bus", "van", "transfer", "driver", "pickup", "train"]),
    ("food", &["food", "lunch", "dinner", "breakfast", "meal", "restaurant"]),
    ("accommodation", &["hotel", "room", "hostel", "lodge"]),
    ("safety", &["safe", "unsafe", "dangerous", "accident", "injury"]),
];

const EN_INTENTS: &[(Intent, &[&str])] = &[
    (Intent::Complaint, &["complaint", "complain", "refund", "unacceptable", "terrible", "worst", "disappointed", "never again"]),
    (Intent::Inquiry, &["how", "what", "when", "where", "which", "can i", "could you", "is there", "do you"]),
    (Intent::Compliment, &["thank", "thanks", "amazing", "excellent", "loved", "great", "wonderful"]),
    (Intent::Recommendation, &["recommend", "suggest", "should try", "must see", "must do"]),
];

const EN_CRITICAL: &[&str] = &["emergency", "urgent", "urgently", "immediately", "asap", "stranded", "police", "hospital", "lawyer", "injured", "accident"];
const EN_HIGH: &[&str] = &["now", "today", "refund", "cancel", "cancelled", "manager", "complaint", "still", "waiting"];

// ── Spanish ───────────────────────────────────────────────────

const ES_VALENCE: &[(&str, f64)] = &[
    ("bueno", 1.9),
    ("buena", 1.9),
    ("excelente", 3.2),
    ("fantástico", 3.0),
    ("genial", 2.8),
    ("hermoso", 2.9),
    ("increíble", 2.9),
    ("maravilloso", 2.7),
    ("encantó", 3.0),
    ("gracias", 1.9),
    ("perfecto", 2.7),
    ("recomiendo", 1.8),
    ("feliz", 2.7),
    ("amable", 2.0),
    ("delicioso", 2.7),
    ("malo", -2.5),
    ("mala", -2.5),
    ("terrible", -2.1),
    ("horrible", -2.5),
    ("pésimo", -3.0),
    ("peor", -3.1),
    ("sucio", -1.9),
    ("grosero", -2.0),
    ("decepcionado", -2.1),
    ("decepcionante", -2.2),
    ("enojado", -2.3),
    ("frustrado", -2.4),
    ("retraso", -1.3),
    ("tarde", -1.0),
    ("problema", -1.7),
    ("inaceptable", -2.6),
    ("estafa", -3.2),
    ("cancelado", -1.8),
    ("peligroso", -2.4),
];

const ES_NEGATIONS: &[&str] = &["no", "nunca", "jamás", "nada", "ni", "sin", "tampoco", "ningún", "ninguna"];

const ES_BOOSTERS: &[(&str, f64)] = &[
    ("muy", 0.293),
    ("súper", 0.293),
    ("super", 0.293),
    ("totalmente", 0.293),
    ("realmente", 0.293),
    ("extremadamente", 0.293),
    ("tan", 0.293),
    ("poco", -0.293),
    ("algo", -0.293),
];

const ES_CONTRAST: &[&str] = &["pero", "aunque"];

const ES_EMOTIONS: &[(Emotion, &[&str])] = &[
    (Emotion::Joy, &["feliz", "encantó", "encanta", "alegre", "disfrutamos", "maravilloso"]),
    (Emotion::Anger, &["enojado", "furioso", "indignado", "odio", "inaceptable", "grosero"]),
    (Emotion::Fear, &["miedo", "asustado", "preocupado", "peligroso", "inseguro", "varado"]),
    (Emotion::Sadness, &["triste", "decepcionado", "decepcionante", "lástima"]),
    (Emotion::Surprise, &["sorprendido", "inesperado", "increíble"]),
    (Emotion::Disgust, &["asco", "sucio", "asqueroso"]),
    (Emotion::Frustration, &["frustrado", "esperando", "otra vez", "todavía", "retraso"]),
];

const ES_TOPICS: &[(&str, &[&str])] = &[
    ("booking", &["reserva", "reservación", "boleto", "confirmación"]),
    ("pricing", &["precio", "costo", "caro", "barato", "reembolso", "dinero", "cobro"]),
    ("guide", &["guía", "guia"]),
    ("transport", &["bus", "autobús", "traslado", "conductor", "tren"]),
    ("food", &["comida", "almuerzo", "cena", "desayuno", "restaurante"]),
    ("accommodation", &["hotel", "habitación", "hostal"]),
    ("safety", &["seguro", "peligroso", "accidente", "herido"]),
];

const ES_INTENTS: &[(Intent, &[&str])] = &[
    (Intent::Complaint, &["queja", "reclamo", "reembolso", "inaceptable", "pésimo", "peor", "nunca más"]),
    (Intent::Inquiry, &["cómo", "como", "qué", "cuándo", "dónde", "cuál", "puedo", "hay"]),
    (Intent::Compliment, &["gracias", "excelente", "maravilloso", "encantó", "genial"]),
    (Intent::Recommendation, &["recomiendo", "recomendamos", "sugiero", "vale la pena"]),
];

const ES_CRITICAL: &[&str] = &["emergencia", "urgente", "inmediatamente", "varado", "policía", "hospital", "abogado", "herido", "accidente"];
const ES_HIGH: &[&str] = &["ahora", "hoy", "reembolso", "cancelar", "cancelado", "gerente", "queja", "todavía", "esperando"];

/// Words that mark an opinion without carrying polarity.
const SUBJECTIVE_MARKERS: &[&str] = &[
    "think", "feel", "felt", "believe", "personally", "opinion", "honestly", "creo", "siento",
    "opino", "personalmente", "sinceramente",
];

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Everything the analyzer needs to know about one language.
#[derive(Debug, Clone)]
pub struct Lexicon {
    language: Language,
    valences: HashMap<String, f64>,
    negations: HashSet<String>,
    boosters: HashMap<String, f64>,
    contrast: Vec<String>,
    emotions: Vec<(Emotion, Vec<String>)>,
    topics: BTreeMap<String, Vec<String>>,
    intents: Vec<(Intent, Vec<String>)>,
    critical: Vec<String>,
    high: Vec<String>,
    subjective: HashSet<String>,
}

impl Lexicon {
    pub fn builtin(language: Language) -> Self {
        let (valence, negations, boosters, contrast, emotions, topics, intents, critical, high) =
            match language {
                Language::English => (
                    EN_VALENCE, EN_NEGATIONS, EN_BOOSTERS, EN_CONTRAST, EN_EMOTIONS, EN_TOPICS,
                    EN_INTENTS, EN_CRITICAL, EN_HIGH,
                ),
                Language::Spanish => (
                    ES_VALENCE, ES_NEGATIONS, ES_BOOSTERS, ES_CONTRAST, ES_EMOTIONS, ES_TOPICS,
                    ES_INTENTS, ES_CRITICAL, ES_HIGH,
                ),
            };
        Self {
            language,
            valences: valence.iter().map(|(w, v)| (w.to_string(), *v)).collect(),
            negations: negations.iter().map(|w| w.to_string()).collect(),
            boosters: boosters.iter().map(|(w, v)| (w.to_string(), *v)).collect(),
            contrast: owned(contrast),
            emotions: emotions.iter().map(|(e, ws)| (*e, owned(ws))).collect(),
            topics: topics
                .iter()
                .map(|(t, ws)| (t.to_string(), owned(ws)))
                .collect(),
            intents: intents.iter().map(|(i, ws)| (*i, owned(ws))).collect(),
            critical: owned(critical),
            high: owned(high),
            subjective: SUBJECTIVE_MARKERS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Merge a rule-defined lexicon. Entries override built-in valences and
    /// topic vocabularies are appended.
    pub fn extend(&mut self, custom: &CompiledLexicon) -> Result<()> {
        let language: Language = custom.language.parse()?;
        if language != self.language {
            return Err(AnalyticsError::Validation(format!(
                "lexicon for '{}' cannot extend the '{}' lexicon",
                language, self.language
            )));
        }
        for (word, valence) in &custom.entries {
            self.valences.insert(word.to_lowercase(), *valence);
        }
        for (topic, words) in &custom.topics {
            let vocab = self.topics.entry(topic.to_lowercase()).or_default();
            for w in words {
                let w = w.to_lowercase();
                if !vocab.contains(&w) {
                    vocab.push(w);
                }
            }
        }
        Ok(())
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn valence(&self, token: &str) -> Option<f64> {
        self.valences.get(token).copied()
    }

    pub fn is_negation(&self, token: &str) -> bool {
        self.negations.contains(token) || token.ends_with("n't")
    }

    pub fn booster(&self, token: &str) -> Option<f64> {
        self.boosters.get(token).copied()
    }

    pub fn is_subjective_marker(&self, token: &str) -> bool {
        self.subjective.contains(token)
    }

    /// Token index of the last contrastive conjunction ("but"), if any.
    pub fn contrast_index(&self, text: &Preprocessed) -> Option<usize> {
        text.tokens
            .iter()
            .rposition(|t| self.contrast.iter().any(|c| c == t))
    }

    pub fn emotions(&self) -> &[(Emotion, Vec<String>)] {
        &self.emotions
    }

    pub fn topics(&self) -> &BTreeMap<String, Vec<String>> {
        &self.topics
    }

    pub fn intents(&self) -> &[(Intent, Vec<String>)] {
        &self.intents
    }

    pub fn critical_terms(&self) -> &[String] {
        &self.critical
    }

    pub fn high_terms(&self) -> &[String] {
        &self.high
    }

    /// Whether `token` belongs to any topic vocabulary.
    pub fn is_topic_term(&self, token: &str) -> bool {
        self.topics.values().any(|ws| ws.iter().any(|w| w == token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(language: &str) -> CompiledLexicon {
        CompiledLexicon {
            language: language.into(),
            entries: [("overbooked".to_string(), -2.4), ("great".to_string(), 1.0)]
                .into_iter()
                .collect(),
            topics: [("guide".to_string(), vec!["Guía".to_string(), "guide".to_string()])]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn builtin_languages_differ() {
        let en = Lexicon::builtin(Language::English);
        let es = Lexicon::builtin(Language::Spanish);
        assert!(en.valence("great").unwrap() > 0.0);
        assert!(es.valence("great").is_none());
        assert!(es.valence("pésimo").unwrap() < 0.0);
        assert!(es.is_negation("nunca"));
        assert!(en.is_negation("didn't"));
    }

    #[test]
    fn extension_overrides_and_appends() {
        let mut en = Lexicon::builtin(Language::English);
        en.extend(&custom("en")).unwrap();
        assert_eq!(en.valence("overbooked"), Some(-2.4));
        assert_eq!(en.valence("great"), Some(1.0));
        let guide = &en.topics()["guide"];
        assert_eq!(guide.iter().filter(|w| *w == "guide").count(), 1);
        assert!(guide.contains(&"guía".to_string()));
    }

    #[test]
    fn language_mismatch_is_rejected() {
        let mut es = Lexicon::builtin(Language::Spanish);
        assert!(matches!(es.extend(&custom("en")), Err(AnalyticsError::Validation(_))));
        assert!(matches!(
            es.extend(&custom("fr")),
            Err(AnalyticsError::UnknownCategory { .. })
        ));
    }
}
