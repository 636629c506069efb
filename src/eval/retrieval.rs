//! Retrieval metrics: precision@k, recall@k, F1, MRR and NDCG@k

use super::round4;
use crate::document::DocumentRef;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Retrieval scores, each in [0, 1] and rounded to 4 decimals
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RetrievalMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub mrr: f64,
    pub ndcg: f64,
}

impl RetrievalMetrics {
    pub const NAMES: [&'static str; 5] = ["precision", "recall", "f1_score", "mrr", "ndcg"];

    /// (name, value) pairs in [`Self::NAMES`] order
    pub fn pairs(&self) -> [(&'static str, f64); 5] {
        let values = [self.precision, self.recall, self.f1_score, self.mrr, self.ndcg];
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
        let [precision, recall, f1_score, mrr, ndcg] = Self::NAMES.map(|name| value(name));
        Self {
            precision,
            recall,
            f1_score,
            mrr,
            ndcg,
        }
    }
}

/// Score a ranked retrieval list against a ground-truth set
///
/// Documents are matched by `id`. The query is accepted for symmetry with
/// the other scoring calls but does not affect the result.
pub fn score_retrieval(
    _query: &str,
    retrieved: &[DocumentRef],
    relevant: &[DocumentRef],
    k: usize,
) -> RetrievalMetrics {
    if retrieved.is_empty() {
        return RetrievalMetrics::default();
    }

    let relevant_ids: HashSet<&str> = relevant.iter().map(|d| d.id.as_str()).collect();
    let top_k = &retrieved[..k.min(retrieved.len())];

    let top_k_ids: HashSet<&str> = top_k.iter().map(|d| d.id.as_str()).collect();
    let hits = top_k_ids.intersection(&relevant_ids).count() as f64;

    let precision = if top_k.is_empty() {
        0.0
    } else {
        hits / top_k.len() as f64
    };
    let recall = if relevant_ids.is_empty() {
        0.0
    } else {
        hits / relevant_ids.len() as f64
    };
    let f1_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    RetrievalMetrics {
        precision: round4(precision),
        recall: round4(recall),
        f1_score: round4(f1_score),
        mrr: round4(reciprocal_rank(retrieved, &relevant_ids)),
        ndcg: round4(ndcg(top_k, &relevant_ids, k)),
    }
}

/// Inverse 1-based rank of the first relevant document, over the full list
fn reciprocal_rank(retrieved: &[DocumentRef], relevant: &HashSet<&str>) -> f64 {
    retrieved
        .iter()
        .position(|d| relevant.contains(d.id.as_str()))
        .map_or(0.0, |i| 1.0 / (i + 1) as f64)
}

/// Binary-gain NDCG; a repeated relevant id only earns gain once
fn ndcg(top_k: &[DocumentRef], relevant: &HashSet<&str>, k: usize) -> f64 {
    let discount = |i: usize| 1.0 / ((i + 2) as f64).log2();

    let mut seen = HashSet::new();
    let dcg: f64 = top_k
        .iter()
        .enumerate()
        .filter(|(_, d)| relevant.contains(d.id.as_str()) && seen.insert(d.id.as_str()))
        .map(|(i, _)| discount(i))
        .sum();

    let idcg: f64 = (0..relevant.len().min(k)).map(discount).sum();

    if idcg > 0.0 {
        dcg / idcg
    } else {
        0.0
    }
}
