//! Named text and vector similarity measures
//!
//! Unknown measure names, empty inputs and mismatched dimensions all score
//! 0.0 instead of failing.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::warn;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("punctuation pattern must compile"));

/// Lowercased word set with punctuation treated as whitespace
fn word_set(text: &str) -> HashSet<String> {
    NON_WORD
        .replace_all(&text.to_lowercase(), " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// |A ∩ B| / sqrt(|A| |B|) over word sets
pub fn cosine_text(a: &str, b: &str) -> f64 {
    let (a, b) = (word_set(a), word_set(b));
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / ((a.len() * b.len()) as f64).sqrt()
}

/// |A ∩ B| / |A ∪ B| over word sets
pub fn jaccard(a: &str, b: &str) -> f64 {
    let (a, b) = (word_set(a), word_set(b));
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

/// Character edit distance
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (long, short) = if a.len() >= b.len() { (&a, &b) } else { (&b, &a) };

    let mut previous: Vec<usize> = (0..=short.len()).collect();
    for (i, c1) in long.iter().enumerate() {
        let mut current = Vec::with_capacity(short.len() + 1);
        current.push(i + 1);
        for (j, c2) in short.iter().enumerate() {
            let insertion = previous[j + 1] + 1;
            let deletion = current[j] + 1;
            let substitution = previous[j] + usize::from(c1 != c2);
            current.push(insertion.min(deletion).min(substitution));
        }
        previous = current;
    }

    previous[short.len()]
}

/// 1 - distance / longer length
pub fn levenshtein(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(a, b) as f64 / longest as f64
}

/// Text similarity by name: `cosine`, `jaccard` or `levenshtein`
pub fn text_similarity(a: &str, b: &str, method: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    match method {
        "cosine" => cosine_text(a, b),
        "jaccard" => jaccard(a, b),
        "levenshtein" => levenshtein(a, b),
        other => {
            warn!("Unknown text similarity method: {}", other);
            0.0
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum()
}

fn norm(a: &[f32]) -> f64 {
    dot(a, a).sqrt()
}

/// Vector similarity by name: `cosine`, `euclidean`, `manhattan` or `dot_product`
///
/// Distances are mapped to similarities as 1 / (1 + d).
pub fn vector_similarity(a: &[f32], b: &[f32], metric: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a.len() != b.len() {
        warn!("Embedding dimensions don't match ({} vs {})", a.len(), b.len());
        return 0.0;
    }

    match metric {
        "cosine" => {
            let denominator = norm(a) * norm(b);
            if denominator == 0.0 {
                0.0
            } else {
                dot(a, b) / denominator
            }
        }
        "euclidean" => {
            let distance: f64 = a
                .iter()
                .zip(b)
                .map(|(x, y)| (f64::from(*x) - f64::from(*y)).powi(2))
                .sum::<f64>()
                .sqrt();
            1.0 / (1.0 + distance)
        }
        "manhattan" => {
            let distance: f64 = a
                .iter()
                .zip(b)
                .map(|(x, y)| (f64::from(*x) - f64::from(*y)).abs())
                .sum();
            1.0 / (1.0 + distance)
        }
        "dot_product" => dot(a, b),
        other => {
            warn!("Unsupported similarity metric: {}", other);
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_measures() {
        assert_eq!(jaccard("The cat, the hat!", "a cat"), 1.0 / 4.0);
        assert_eq!(cosine_text("red fish", "red fish"), 1.0);
        assert_eq!(cosine_text("a b c d", "a"), 0.5);
        assert_eq!(levenshtein("kitten", "sitting"), 1.0 - 3.0 / 7.0);
        assert_eq!(levenshtein_distance("", "abc"), 3);
    }

    #[test]
    fn test_text_similarity_fallbacks() {
        assert_eq!(text_similarity("", "x", "cosine"), 0.0);
        assert_eq!(text_similarity("x", "x", "soundex"), 0.0);
        assert_eq!(text_similarity("x", "x", "levenshtein"), 1.0);
    }

    #[test]
    fn test_vector_measures() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];

        assert_eq!(vector_similarity(&a, &a, "cosine"), 1.0);
        assert_eq!(vector_similarity(&a, &b, "cosine"), 0.0);
        assert_eq!(vector_similarity(&a, &b, "manhattan"), 1.0 / 3.0);
        assert_eq!(vector_similarity(&[3.0, 0.0], &[0.0, 4.0], "euclidean"), 1.0 / 6.0);
        assert_eq!(vector_similarity(&[2.0, 3.0], &[4.0, 5.0], "dot_product"), 23.0);
    }

    #[test]
    fn test_vector_fallbacks() {
        assert_eq!(vector_similarity(&[1.0], &[1.0, 2.0], "cosine"), 0.0);
        assert_eq!(vector_similarity(&[], &[], "cosine"), 0.0);
        assert_eq!(vector_similarity(&[1.0], &[1.0], "hamming"), 0.0);
        assert_eq!(vector_similarity(&[0.0], &[1.0], "cosine"), 0.0);
    }
}
