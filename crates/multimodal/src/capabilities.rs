//! Which tasks each modality supports.

use tracing::warn;

use crate::types::{Modality, TaskType};

const TEXT_TASKS: &[TaskType] = &[
    TaskType::SentimentAnalysis,
    TaskType::KeywordExtraction,
    TaskType::Classification,
    TaskType::ContentModeration,
    TaskType::Embedding,
];

const IMAGE_TASKS: &[TaskType] = &[
    TaskType::Classification,
    TaskType::ObjectDetection,
    TaskType::Captioning,
    TaskType::Ocr,
    TaskType::ContentModeration,
    TaskType::Embedding,
];

const AUDIO_TASKS: &[TaskType] = &[
    TaskType::SpeechToText,
    TaskType::AudioClassification,
    TaskType::ContentModeration,
    TaskType::Embedding,
];

const VIDEO_TASKS: &[TaskType] = &[
    TaskType::Classification,
    TaskType::ObjectDetection,
    TaskType::SceneDetection,
    TaskType::ContentModeration,
    TaskType::Embedding,
];

pub fn supported_tasks(modality: Modality) -> &'static [TaskType] {
    match modality {
        Modality::Text => TEXT_TASKS,
        Modality::Image => IMAGE_TASKS,
        Modality::Audio => AUDIO_TASKS,
        Modality::Video => VIDEO_TASKS,
    }
}

pub fn supports(modality: Modality, task: TaskType) -> bool {
    supported_tasks(modality).contains(&task)
}

/// Split `requested` into supported tasks (deduplicated, request order) and
/// the ones dropped. Dropped tasks are logged.
pub fn partition(modality: Modality, requested: &[TaskType]) -> (Vec<TaskType>, Vec<TaskType>) {
    let mut valid = Vec::new();
    let mut dropped = Vec::new();
    for &task in requested {
        if supports(modality, task) {
            if !valid.contains(&task) {
                valid.push(task);
            }
        } else {
            warn!(modality = %modality, task = %task, "task not supported for modality; dropped");
            dropped.push(task);
        }
    }
    (valid, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_table() {
        assert!(supports(Modality::Image, TaskType::Ocr));
        assert!(supports(Modality::Image, TaskType::Captioning));
        assert!(!supports(Modality::Image, TaskType::SpeechToText));
    }

    #[test]
    fn audio_drops_vision_tasks() {
        let (valid, dropped) = partition(
            Modality::Audio,
            &[TaskType::Ocr, TaskType::ObjectDetection],
        );
        assert!(valid.is_empty());
        assert_eq!(dropped, [TaskType::Ocr, TaskType::ObjectDetection]);
    }

    #[test]
    fn duplicates_collapse() {
        let (valid, _) = partition(
            Modality::Text,
            &[TaskType::Embedding, TaskType::SentimentAnalysis, TaskType::Embedding],
        );
        assert_eq!(valid, [TaskType::Embedding, TaskType::SentimentAnalysis]);
    }

    #[test]
    fn every_task_has_a_home() {
        for task in TaskType::ALL {
            assert!(Modality::ALL.iter().any(|m| supports(*m, task)), "{task}");
        }
    }
}
