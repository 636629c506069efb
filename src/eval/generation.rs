//! Lexical generation metrics
//!
//! Simple lexical approximations: unigram BLEU with a
//! brevity penalty, set-based unigram ROUGE recall, and regex heuristics
//! for relevance, consistency and completeness.

use super::round4;
use crate::document::DocumentRef;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

/// Generation scores, rounded to 4 decimals
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationMetrics {
    pub bleu_score: f64,
    pub rouge_score: f64,
    pub relevance_score: f64,
    pub consistency_score: f64,
    pub completeness_score: f64,
}

impl GenerationMetrics {
    pub const NAMES: [&'static str; 5] = [
        "bleu_score",
        "rouge_score",
        "relevance_score",
        "consistency_score",
        "completeness_score",
    ];

    /// (name, value) pairs in [`Self::NAMES`] order
    pub fn pairs(&self) -> [(&'static str, f64); 5] {
        let values = [
            self.bleu_score,
            self.rouge_score,
            self.relevance_score,
            self.consistency_score,
            self.completeness_score,
        ];
        std::array::from_fn(|i| (Self::NAMES[i], values[i]))
    }

    /// Look up a metric by name; unknown names score 0.0
    pub fn get(&self, name: &str) -> f64 {
        self.pairs()
            .iter()
            .find(|(n, _)| *n == name)
            .map_or(0.0, |(_, v)| *v)
    }

    pub(crate) fn from_fn(mut value: impl FnMut(&str) -> f64) -> Self {
        let [bleu_score, rouge_score, relevance_score, consistency_score, completeness_score] =
            Self::NAMES.map(|name| value(name));
        Self {
            bleu_score,
            rouge_score,
            relevance_score,
            consistency_score,
            completeness_score,
        }
    }
}

/// Decides whether a fact from the answer contradicts the context
pub trait ContradictionPolicy: Send + Sync {
    fn is_contradictory(&self, fact: &str, context_facts: &[String]) -> bool;
}

/// No-op policy: nothing is ever contradictory
///
/// With this policy `consistency_score` is 1.0 whenever the context is
/// non-empty. Plug in a real policy through
/// [`crate::eval::Evaluator::with_policy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverContradicts;

impl ContradictionPolicy for NeverContradicts {
    fn is_contradictory(&self, _fact: &str, _context_facts: &[String]) -> bool {
        false
    }
}

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
    "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did", "will",
    "would", "could", "should", "may", "might", "can", "this", "that", "these", "those",
];

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in metric pattern must compile")
}

static WORD: LazyLock<Regex> = LazyLock::new(|| compile(r"\b\w+\b"));

static FACT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        compile(r"\d+"),
        compile(r"\b\d{4}\b"),
        compile(r"\b[A-Z][a-z]+ [A-Z][a-z]+\b"),
        compile(r"\b[A-Z][a-z]+ [A-Z][a-z]+ [A-Z][a-z]+\b"),
    ]
});

static KEY_INFO_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        compile(r"\b[A-Z][a-z]+ [A-Z][a-z]+\b"),
        compile(r"\b\d+[.,]\d+\b"),
        compile(r"\b[A-Z]{2,}\b"),
    ]
});

fn lower_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn joined_content(context: &[DocumentRef]) -> String {
    context
        .iter()
        .map(|d| d.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercased words longer than two characters, stop words removed
pub fn extract_key_terms(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD.find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Distinct numbers, years and capitalized name sequences, sorted
pub fn extract_facts(text: &str) -> Vec<String> {
    let facts: BTreeSet<String> = FACT_PATTERNS
        .iter()
        .flat_map(|re| re.find_iter(text).map(|m| m.as_str().to_string()))
        .collect();
    facts.into_iter().collect()
}

/// Proper-noun pairs, decimal numbers and acronyms
pub fn extract_key_information(text: &str) -> HashSet<String> {
    KEY_INFO_PATTERNS
        .iter()
        .flat_map(|re| re.find_iter(text).map(|m| m.as_str().to_string()))
        .collect()
}

/// Unigram precision against the reference times a brevity penalty
pub fn bleu_score(generated: &str, reference: &str) -> f64 {
    let generated = lower_tokens(generated);
    let reference = lower_tokens(reference);

    if generated.is_empty() {
        return 0.0;
    }

    let vocabulary: HashSet<&str> = reference.iter().map(String::as_str).collect();
    let overlaps = generated
        .iter()
        .filter(|t| vocabulary.contains(t.as_str()))
        .count();
    let precision = overlaps as f64 / generated.len() as f64;

    let penalty = if generated.len() >= reference.len() {
        1.0
    } else {
        (1.0 - reference.len() as f64 / generated.len() as f64).exp()
    };

    penalty * precision
}

/// Fraction of distinct reference tokens present in the generated text
pub fn rouge_score(generated: &str, reference: &str) -> f64 {
    let generated: HashSet<String> = lower_tokens(generated).into_iter().collect();
    let reference: HashSet<String> = lower_tokens(reference).into_iter().collect();

    if reference.is_empty() {
        return 0.0;
    }

    generated.intersection(&reference).count() as f64 / reference.len() as f64
}

/// Fraction of context key terms that the answer also uses
pub fn relevance_score(answer: &str, context: &[DocumentRef]) -> f64 {
    if context.is_empty() {
        return 0.0;
    }

    let context_terms: HashSet<String> =
        extract_key_terms(&joined_content(context)).into_iter().collect();
    if context_terms.is_empty() {
        return 0.0;
    }

    let answer_terms: HashSet<String> = extract_key_terms(answer).into_iter().collect();
    let overlap = answer_terms.intersection(&context_terms).count() as f64;

    (overlap / context_terms.len() as f64).min(1.0)
}

/// 1 minus the share of answer facts the policy flags as contradictory
pub fn consistency_score(
    answer: &str,
    context: &[DocumentRef],
    policy: &dyn ContradictionPolicy,
) -> f64 {
    if context.is_empty() {
        return 0.0;
    }

    let context_facts = extract_facts(&joined_content(context));
    let answer_facts = extract_facts(answer);

    if context_facts.is_empty() || answer_facts.is_empty() {
        return 1.0;
    }

    let contradictions = answer_facts
        .iter()
        .filter(|fact| policy.is_contradictory(fact.as_str(), &context_facts))
        .count();

    (1.0 - contradictions as f64 / answer_facts.len() as f64).max(0.0)
}

/// Share of the reference's key information found in the generated text
pub fn completeness_score(generated: &str, reference: &str) -> f64 {
    if reference.is_empty() {
        return 1.0;
    }

    let reference_info = extract_key_information(reference);
    if reference_info.is_empty() {
        return 1.0;
    }

    let generated_info = extract_key_information(generated);
    reference_info.intersection(&generated_info).count() as f64 / reference_info.len() as f64
}

/// Score a generated answer with the no-op contradiction policy
pub fn score_generation(
    generated: &str,
    reference: &str,
    context: &[DocumentRef],
) -> GenerationMetrics {
    score_generation_with(generated, reference, context, &NeverContradicts)
}

/// Score a generated answer against a reference and its retrieval context
pub fn score_generation_with(
    generated: &str,
    reference: &str,
    context: &[DocumentRef],
    policy: &dyn ContradictionPolicy,
) -> GenerationMetrics {
    GenerationMetrics {
        bleu_score: round4(bleu_score(generated, reference)),
        rouge_score: round4(rouge_score(generated, reference)),
        relevance_score: round4(relevance_score(generated, context)),
        consistency_score: round4(consistency_score(generated, context, policy)),
        completeness_score: round4(completeness_score(generated, reference)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_line_up_with_fields() {
        let metrics = GenerationMetrics {
            bleu_score: 0.1,
            rouge_score: 0.2,
            relevance_score: 0.3,
            consistency_score: 0.4,
            completeness_score: 0.5,
        };

        let names: Vec<_> = metrics.pairs().iter().map(|(name, _)| *name).collect();
        assert_eq!(names, GenerationMetrics::NAMES);
        assert_eq!(metrics.get("consistency_score"), 0.4);
        assert_eq!(GenerationMetrics::from_fn(|name| metrics.get(name)), metrics);
    }

    fn context(texts: &[&str]) -> Vec<DocumentRef> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| DocumentRef::new(i.to_string(), *t))
            .collect()
    }

    struct FlagYears;

    impl ContradictionPolicy for FlagYears {
        fn is_contradictory(&self, fact: &str, context_facts: &[String]) -> bool {
            fact.len() == 4
                && fact.chars().all(|c| c.is_ascii_digit())
                && !context_facts.iter().any(|f| f == fact)
        }
    }

    #[test]
    fn test_identical_answer_and_reference() {
        let answer = "Paris is the capital of France";
        let m = score_generation(answer, answer, &context(&["Paris hosts the French government"]));

        assert_eq!(m.bleu_score, 1.0);
        assert_eq!(m.rouge_score, 1.0);
        assert_eq!(m.completeness_score, 1.0);
    }

    #[test]
    fn test_bleu_brevity_penalty() {
        // 2 of 2 tokens match, reference is twice as long
        let score = bleu_score("the cat", "the cat sat down");
        assert!((score - (-1.0f64).exp()).abs() < 1e-12);
        assert_eq!(bleu_score("", "anything"), 0.0);
    }

    #[test]
    fn test_rouge_is_case_insensitive_recall() {
        assert_eq!(rouge_score("The CAT", "the cat sat sat"), 2.0 / 3.0);
        assert_eq!(rouge_score("words", ""), 0.0);
    }

    #[test]
    fn test_key_terms_filter_stop_words() {
        assert_eq!(
            extract_key_terms("The quick fox is in the den"),
            vec!["quick", "fox", "den"]
        );
    }

    #[test]
    fn test_relevance() {
        let ctx = context(&["rust borrow checker", "ownership rules"]);
        // context terms: rust, borrow, checker, ownership, rules
        assert_eq!(relevance_score("the borrow checker enforces ownership", &ctx), 0.6);
        assert_eq!(relevance_score("anything", &[]), 0.0);
        assert_eq!(relevance_score("anything", &context(&["a an"])), 0.0);
    }

    #[test]
    fn test_consistency_default_policy() {
        let ctx = context(&["Released in 1999 by Sun Microsystems"]);
        assert_eq!(consistency_score("It shipped in 2004", &ctx, &NeverContradicts), 1.0);
        assert_eq!(consistency_score("It shipped in 2004", &[], &NeverContradicts), 0.0);
        assert_eq!(consistency_score("no facts here", &ctx, &NeverContradicts), 1.0);
    }

    #[test]
    fn test_consistency_with_custom_policy() {
        let ctx = context(&["Released in 1999"]);
        let score = consistency_score("Released in 2004", &ctx, &FlagYears);
        assert_eq!(score, 0.0);

        let score = consistency_score("Released in 1999 after 3 years", &ctx, &FlagYears);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_completeness() {
        let reference = "NASA launched Apollo Eleven with 3.5 tons";
        assert_eq!(completeness_score("NASA did it", reference), 1.0 / 3.0);
        assert_eq!(completeness_score("nothing", ""), 1.0);
        assert_eq!(completeness_score("nothing", "plain words only"), 1.0);
    }

    #[test]
    fn test_extract_facts_dedupes() {
        let facts = extract_facts("In 2020 and 2020, Ada Lovelace wrote 3 notes");
        assert_eq!(facts, vec!["2020", "3", "Ada Lovelace"]);
    }
}
