use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spirit_core::AnalyticsError;
use spirit_sentiment::Language;

use crate::error::{ProcessingError, Result};

// ── Modality ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Text,
    Image,
    Audio,
    Video,
}

impl Modality {
    pub const ALL: [Modality; 4] = [Modality::Text, Modality::Image, Modality::Audio, Modality::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Image => "image",
            Modality::Audio => "audio",
            Modality::Video => "video",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Modality::Text),
            "image" | "img" => Ok(Modality::Image),
            "audio" => Ok(Modality::Audio),
            "video" => Ok(Modality::Video),
            other => Err(AnalyticsError::unknown("modality", other)),
        }
    }
}

// ── Task type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    SentimentAnalysis,
    KeywordExtraction,
    Classification,
    ObjectDetection,
    Captioning,
    Ocr,
    ContentModeration,
    Embedding,
    SpeechToText,
    AudioClassification,
    SceneDetection,
}

impl TaskType {
    pub const ALL: [TaskType; 11] = [
        TaskType::SentimentAnalysis,
        TaskType::KeywordExtraction,
        TaskType::Classification,
        TaskType::ObjectDetection,
        TaskType::Captioning,
        TaskType::Ocr,
        TaskType::ContentModeration,
        TaskType::Embedding,
        TaskType::SpeechToText,
        TaskType::AudioClassification,
        TaskType::SceneDetection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::SentimentAnalysis => "sentiment_analysis",
            TaskType::KeywordExtraction => "keyword_extraction",
            TaskType::Classification => "classification",
            TaskType::ObjectDetection => "object_detection",
            TaskType::Captioning => "captioning",
            TaskType::Ocr => "ocr",
            TaskType::ContentModeration => "content_moderation",
            TaskType::Embedding => "embedding",
            TaskType::SpeechToText => "speech_to_text",
            TaskType::AudioClassification => "audio_classification",
            TaskType::SceneDetection => "scene_detection",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "sentiment" => return Ok(TaskType::SentimentAnalysis),
            "keywords" => return Ok(TaskType::KeywordExtraction),
            "transcription" | "stt" => return Ok(TaskType::SpeechToText),
            "moderation" => return Ok(TaskType::ContentModeration),
            _ => {}
        }
        TaskType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| AnalyticsError::unknown("task type", s))
    }
}

// ── Safety ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    Safe,
    Moderate,
    Unsafe,
    Blocked,
}

// ── Content ──────────────────────────────────────────────────

/// One piece of media plus its declared modality.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    pub modality: Modality,
    pub data: Bytes,
    pub mime_type: Option<String>,
    /// Language hint for text content.
    pub language: Option<Language>,
}

impl Content {
    pub fn new(modality: Modality, data: impl Into<Bytes>) -> Self {
        Self {
            modality,
            data: data.into(),
            mime_type: None,
            language: None,
        }
    }

    pub fn text(text: impl Into<String>, language: Language) -> Self {
        Self {
            language: Some(language),
            mime_type: Some("text/plain".into()),
            ..Self::new(Modality::Text, Bytes::from(text.into()))
        }
    }

    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    /// UTF-8 view of text content.
    pub fn as_text(&self) -> Result<&str> {
        std::str::from_utf8(&self.data)
            .map_err(|e| ProcessingError::InvalidContent(format!("text is not valid UTF-8: {e}")))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// ── Results ──────────────────────────────────────────────────

/// What a processor returns for one task, before the router stamps it.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutput {
    pub payload: serde_json::Value,
    /// In `[0, 1]`.
    pub confidence: f64,
    /// Set when the processor classified safety itself.
    pub safety: Option<SafetyLevel>,
}

impl TaskOutput {
    pub fn new(payload: serde_json::Value, confidence: f64) -> Self {
        Self {
            payload,
            confidence: confidence.clamp(0.0, 1.0),
            safety: None,
        }
    }

    pub fn with_safety(mut self, safety: SafetyLevel) -> Self {
        self.safety = Some(safety);
        self
    }
}

/// Result of one task execution. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub task_id: Uuid,
    pub modality: Modality,
    pub task_type: TaskType,
    pub result: serde_json::Value,
    pub confidence: f64,
    pub processing_time_ms: f64,
    pub safety_level: SafetyLevel,
    /// Name of the processor that produced the result.
    pub processor: String,
    /// Hex SHA-256 of the input bytes.
    pub content_digest: String,
    pub created_at: DateTime<Utc>,
}
