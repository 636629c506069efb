//! Heuristic response-quality criteria

use std::collections::BTreeMap;

const HELPFUL_INDICATORS: &[&str] = &[
    "here",
    "example",
    "solution",
    "answer",
    "explanation",
    "because",
    "therefore",
    "however",
    "additionally",
];

/// Shorter sentences score higher; 10 words or fewer is a perfect 1.0
pub fn clarity(response: &str) -> f64 {
    if response.is_empty() {
        return 0.0;
    }

    // Split on '.' as-is, so a trailing period yields an empty sentence
    let sentences: Vec<&str> = response.split('.').collect();
    let words: usize = sentences.iter().map(|s| s.split_whitespace().count()).sum();
    let average = words as f64 / sentences.len() as f64;

    (1.0 - (average - 10.0) / 20.0).clamp(0.0, 1.0)
}

/// 1.0 for 50 to 100 words, ramping up below and decaying to 0 at 200
pub fn conciseness(response: &str) -> f64 {
    if response.is_empty() {
        return 0.0;
    }

    let words = response.split_whitespace().count() as f64;
    if (50.0..=100.0).contains(&words) {
        1.0
    } else if words < 50.0 {
        words / 50.0
    } else {
        (1.0 - (words - 100.0) / 100.0).max(0.0)
    }
}

/// Neutral placeholder: accuracy needs domain knowledge
pub fn accuracy(_response: &str) -> f64 {
    0.5
}

/// One fifth per helpful indicator word present, capped at 1.0
pub fn helpfulness(response: &str) -> f64 {
    if response.is_empty() {
        return 0.0;
    }

    let lower = response.to_lowercase();
    let hits = HELPFUL_INDICATORS
        .iter()
        .filter(|indicator| lower.contains(**indicator))
        .count();

    (hits as f64 / 5.0).min(1.0)
}

/// Score one criterion by name; unknown criteria score 0.0
pub fn score_criterion(response: &str, criterion: &str) -> f64 {
    match criterion {
        "clarity" => clarity(response),
        "conciseness" => conciseness(response),
        "accuracy" => accuracy(response),
        "helpfulness" => helpfulness(response),
        _ => 0.0,
    }
}

/// Score every requested criterion
pub fn score_quality(response: &str, criteria: &[String]) -> BTreeMap<String, f64> {
    criteria
        .iter()
        .map(|criterion| (criterion.clone(), score_criterion(response, criterion)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clarity() {
        assert_eq!(clarity(""), 0.0);
        assert_eq!(clarity("Short one. Another short one."), 1.0);

        // 30 words in one sentence: 1 - (30 - 10) / 20 = 0
        let long = vec!["word"; 30].join(" ");
        assert_eq!(clarity(&long), 0.0);

        // 20 words: 1 - 10 / 20
        let medium = vec!["word"; 20].join(" ");
        assert_eq!(clarity(&medium), 0.5);
    }

    #[test]
    fn test_conciseness() {
        assert_eq!(conciseness(""), 0.0);
        assert_eq!(conciseness(&vec!["w"; 25].join(" ")), 0.5);
        assert_eq!(conciseness(&vec!["w"; 75].join(" ")), 1.0);
        assert_eq!(conciseness(&vec!["w"; 150].join(" ")), 0.5);
        assert_eq!(conciseness(&vec!["w"; 400].join(" ")), 0.0);
    }

    #[test]
    fn test_helpfulness() {
        assert_eq!(helpfulness("Here is an example because you asked"), 0.6);
        assert_eq!(helpfulness("nothing useful"), 0.0);
    }

    #[test]
    fn test_unknown_criterion_scores_zero() {
        let criteria = vec!["accuracy".to_string(), "vibes".to_string()];
        let scores = score_quality("anything", &criteria);

        assert_eq!(scores["accuracy"], 0.5);
        assert_eq!(scores["vibes"], 0.0);
    }
}
