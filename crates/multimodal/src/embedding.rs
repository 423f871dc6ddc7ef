//! Histogram embeddings: a fixed-size, L2-normalized summary of the raw
//! input usable for near-duplicate detection.

pub const DIMENSIONS: usize = 64;

/// Byte histogram, 4 byte values per bin.
pub fn byte_histogram(data: &[u8]) -> Vec<f64> {
    let mut bins = vec![0.0; DIMENSIONS];
    for &b in data {
        bins[usize::from(b) * DIMENSIONS / 256] += 1.0;
    }
    normalize(bins)
}

/// Character histogram over lowercased alphanumerics, hashed into bins so
/// accented letters share the space with ASCII.
pub fn text_histogram(text: &str) -> Vec<f64> {
    let mut bins = vec![0.0; DIMENSIONS];
    for c in text.chars().flat_map(char::to_lowercase).filter(|c| c.is_alphanumeric()) {
        bins[(c as usize) % DIMENSIONS] += 1.0;
    }
    normalize(bins)
}

fn normalize(mut v: Vec<f64>) -> Vec<f64> {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_length() {
        let v = byte_histogram(b"some bytes here");
        assert_eq!(v.len(), DIMENSIONS);
        assert!((v.iter().map(|x| x * x).sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(byte_histogram(&[]).iter().all(|x| *x == 0.0));
    }

    #[test]
    fn similar_texts_are_close() {
        let a = text_histogram("Machu Picchu sunrise tour");
        let b = text_histogram("machu picchu sunrise tours");
        let c = text_histogram("zzz 999 qqq");
        assert!(cosine(&a, &b) > 0.95);
        assert!(cosine(&a, &c) < cosine(&a, &b));
    }
}
