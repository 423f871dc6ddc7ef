use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use tracing::{debug, info};
use uuid::Uuid;

use spirit_core::{AnalyticsError, Result};
use spirit_rules::sentiment_lexicon::CompiledLexicon;

use crate::language::Language;
use crate::lexicon::Lexicon;
use crate::preprocess::preprocess;
use crate::scorers::{NaiveBayesClassifier, PatternScorer, RuleBasedScorer, SentimentScorer};
use crate::signals;
use crate::types::{
    ConfidenceLevel, Interaction, SentimentAnalysis, SentimentAnalysisRecord, SentimentLevel,
};

/// Polarities within this distance of zero count as neutral when comparing
/// scorers.
const AGREEMENT_BAND: f64 = 0.05;
/// Scorer spread above this (population std) costs one confidence level.
const HIGH_SPREAD: f64 = 0.3;

/// Multi-scorer sentiment analyzer. Cheap to clone; lexicons and scorers
/// are shared.
#[derive(Clone)]
pub struct SentimentAnalyzer {
    lexicons: Arc<HashMap<Language, Lexicon>>,
    scorers: Vec<Arc<dyn SentimentScorer>>,
    classifier: Option<Arc<NaiveBayesClassifier>>,
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentAnalyzer {
    /// Built-in lexicons with the rule-based and pattern scorers.
    pub fn new() -> Self {
        let lexicons = [Language::English, Language::Spanish]
            .into_iter()
            .map(|l| (l, Lexicon::builtin(l)))
            .collect();
        Self {
            lexicons: Arc::new(lexicons),
            scorers: vec![Arc::new(RuleBasedScorer::new()), Arc::new(PatternScorer::new())],
            classifier: None,
        }
    }

    /// Merge rule-defined lexicons into the built-in ones.
    pub fn with_lexicons(mut self, custom: &[CompiledLexicon]) -> Result<Self> {
        let lexicons = Arc::make_mut(&mut self.lexicons);
        for lex in custom {
            let language: Language = lex.language.parse()?;
            let target = lexicons
                .get_mut(&language)
                .ok_or_else(|| AnalyticsError::unknown("language", &lex.language))?;
            target.extend(lex)?;
            info!(
                language = %language,
                entries = lex.entries.len(),
                topics = lex.topics.len(),
                "custom lexicon merged"
            );
        }
        Ok(self)
    }

    pub fn with_classifier(mut self, classifier: NaiveBayesClassifier) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn lexicon(&self, language: Language) -> Option<&Lexicon> {
        self.lexicons.get(&language)
    }

    /// Analyze one text. Empty (or whitespace-only) text is rejected.
    pub fn analyze(&self, text: &str, language: Language) -> Result<SentimentAnalysis> {
        if text.trim().is_empty() {
            return Err(AnalyticsError::Validation("cannot analyze empty text".into()));
        }
        let lexicon = self
            .lexicon(language)
            .ok_or_else(|| AnalyticsError::unknown("language", language.code()))?;
        let pre = preprocess(text);

        let mut scorer_scores = IndexMap::new();
        let mut subjectivities = Vec::new();
        let active = self
            .scorers
            .iter()
            .map(|s| &**s as &dyn SentimentScorer)
            .chain(self.classifier.as_deref().map(|c| c as &dyn SentimentScorer));
        for scorer in active {
            let out = scorer.score(&pre, lexicon);
            scorer_scores.insert(scorer.name().to_string(), out.polarity);
            if let Some(s) = out.subjectivity {
                subjectivities.push(s);
            }
        }

        let scores: Vec<f64> = scorer_scores.values().copied().collect();
        let sentiment_score = mean(&scores).clamp(-1.0, 1.0);
        let confidence = confidence(&scores, self.classifier.is_some());
        let emotion_scores = signals::emotion_scores(&pre, lexicon);
        let analysis = SentimentAnalysis {
            overall_sentiment: SentimentLevel::from_score(sentiment_score),
            sentiment_score,
            subjectivity: mean(&subjectivities),
            confidence,
            scorer_scores,
            emotion_scores,
            keywords: signals::keywords(&pre, lexicon),
            topics: signals::topics(&pre, lexicon),
            intent: signals::intent(&pre, lexicon),
            urgency_level: signals::urgency(&pre, lexicon, sentiment_score),
        };

        debug!(
            language = %language,
            tokens = pre.tokens.len(),
            score = analysis.sentiment_score,
            level = %analysis.overall_sentiment,
            confidence = %analysis.confidence,
            urgency = %analysis.urgency_level,
            "text analyzed"
        );
        Ok(analysis)
    }

    pub fn analyze_interaction(&self, interaction: &Interaction) -> Result<SentimentAnalysisRecord> {
        let analysis = self.analyze(&interaction.text, interaction.language)?;
        Ok(SentimentAnalysisRecord {
            id: Uuid::new_v4(),
            interaction_id: interaction.interaction_id.clone(),
            customer_id: interaction.customer_id.clone(),
            language: interaction.language,
            channel: interaction.channel.clone(),
            analysis,
            analyzed_at: Utc::now(),
        })
    }
}

fn mean(v: &[f64]) -> f64 {
    if v.is_empty() {
        0.0
    } else {
        v.iter().sum::<f64>() / v.len() as f64
    }
}

fn polarity_class(score: f64) -> i8 {
    if score > AGREEMENT_BAND {
        1
    } else if score < -AGREEMENT_BAND {
        -1
    } else {
        0
    }
}

/// Agreement-based confidence. All scorers on the same side is high, a
/// neutral/polar mix is medium, opposite signs are low. A wide spread
/// demotes one level; without the classifier the result never exceeds
/// medium, and a lone scorer is low at best.
pub fn confidence(scores: &[f64], has_classifier: bool) -> ConfidenceLevel {
    if scores.len() < 2 {
        return ConfidenceLevel::Low;
    }
    let classes: Vec<i8> = scores.iter().map(|&s| polarity_class(s)).collect();
    let mut level = if classes.iter().all(|c| *c == classes[0]) {
        ConfidenceLevel::High
    } else if classes.contains(&1) && classes.contains(&-1) {
        ConfidenceLevel::Low
    } else {
        ConfidenceLevel::Medium
    };

    let m = mean(scores);
    let spread = (scores.iter().map(|s| (s - m).powi(2)).sum::<f64>() / scores.len() as f64).sqrt();
    if spread > HIGH_SPREAD {
        level = level.demote();
    }
    if !has_classifier {
        level = level.min(ConfidenceLevel::Medium);
    }
    level
}
