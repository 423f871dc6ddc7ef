//! Content safety classification for results that did not get one from
//! their processor.

use crate::media;
use crate::types::{Content, Modality, SafetyLevel};

/// Terms that block text outright.
const BLOCKED_TERMS: &[&str] = &["child abuse", "terrorist attack", "bomb threat"];

/// Terms that each raise text one level.
const FLAGGED_TERMS: &[&str] = &[
    "kill", "weapon", "drugs", "scam", "fraud", "nude", "naked", "violence", "blood", "idiot",
    "stupid", "matar", "arma", "drogas", "estafa", "fraude", "desnudo", "violencia", "idiota",
];

pub fn classify_text(text: &str) -> SafetyLevel {
    let lower = text.to_lowercase();
    if BLOCKED_TERMS.iter().any(|t| lower.contains(t)) {
        return SafetyLevel::Blocked;
    }
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let hits = FLAGGED_TERMS
        .iter()
        .filter(|t| words.contains(t))
        .count();
    match hits {
        0 => SafetyLevel::Safe,
        1 => SafetyLevel::Moderate,
        _ => SafetyLevel::Unsafe,
    }
}

/// Text is checked against the term lists. Binary media is safe when its
/// container is recognized and moderate otherwise, since nothing about an
/// unknown payload can be verified.
pub fn classify(content: &Content) -> SafetyLevel {
    match content.modality {
        Modality::Text => content
            .as_text()
            .map(classify_text)
            .unwrap_or(SafetyLevel::Moderate),
        Modality::Image => recognized(media::sniff_image(&content.data).is_some()),
        Modality::Audio => recognized(media::sniff_audio(&content.data).is_some()),
        Modality::Video => recognized(media::sniff_video(&content.data).is_some()),
    }
}

fn recognized(known: bool) -> SafetyLevel {
    if known {
        SafetyLevel::Safe
    } else {
        SafetyLevel::Moderate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spirit_sentiment::Language;

    #[test]
    fn text_levels() {
        assert_eq!(classify_text("Lovely sunset over the lake"), SafetyLevel::Safe);
        assert_eq!(classify_text("This tour is a scam"), SafetyLevel::Moderate);
        assert_eq!(classify_text("scam and fraud, you idiot"), SafetyLevel::Unsafe);
        assert_eq!(classify_text("There was a BOMB THREAT at the station"), SafetyLevel::Blocked);
        // Whole words only.
        assert_eq!(classify_text("Skilled guide"), SafetyLevel::Safe);
    }

    #[test]
    fn media_levels() {
        let png = Content::new(Modality::Image, media::test_png(10, 10));
        assert_eq!(classify(&png), SafetyLevel::Safe);
        let junk = Content::new(Modality::Image, b"not an image".to_vec());
        assert_eq!(classify(&junk), SafetyLevel::Moderate);
        let text = Content::text("drogas", Language::Spanish);
        assert_eq!(classify(&text), SafetyLevel::Moderate);
    }
}
