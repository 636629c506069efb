//! Candidate ranking
//!
//! This module handles:
//! - Scoring candidates against a query by text or embedding similarity
//! - Score filtering
//! - Deduplication by owning document

mod similarity;

pub use similarity::*;

use crate::document::DocumentRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A candidate with its similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub id: String,
    pub score: f64,
    pub document_id: Option<String>,
    pub content: String,
}

impl RankedResult {
    fn scored(doc: DocumentRef, score: f64) -> Self {
        Self {
            id: doc.id,
            score,
            document_id: doc.document_id,
            content: doc.content,
        }
    }

    /// Key used for deduplication: the owning document, else the id
    fn document_key(&self) -> &str {
        self.document_id.as_deref().unwrap_or(&self.id)
    }
}

impl From<RankedResult> for DocumentRef {
    fn from(result: RankedResult) -> Self {
        Self {
            id: result.id,
            content: result.content,
            document_id: result.document_id,
            score: Some(result.score),
            ..Default::default()
        }
    }
}

fn sort_descending(results: &mut [RankedResult]) {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
}

/// Rank and filter retrieval candidates
#[derive(Debug, Clone)]
pub struct Ranker {
    text_method: String,
    vector_metric: String,
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new("cosine", "cosine")
    }
}

impl Ranker {
    /// Create a ranker with named text and vector measures
    pub fn new(text_method: &str, vector_metric: &str) -> Self {
        Self {
            text_method: text_method.to_string(),
            vector_metric: vector_metric.to_string(),
        }
    }

    /// Rank candidates by text similarity to the query
    pub fn rank(&self, query: &str, candidates: Vec<DocumentRef>) -> Vec<RankedResult> {
        let mut ranked: Vec<RankedResult> = candidates
            .into_iter()
            .map(|doc| {
                let score = text_similarity(query, &doc.content, &self.text_method);
                RankedResult::scored(doc, score)
            })
            .collect();

        sort_descending(&mut ranked);
        ranked
    }

    /// Rank candidates by embedding similarity to the query embedding
    pub fn rank_by_embedding(
        &self,
        query_embedding: &[f32],
        candidates: Vec<(DocumentRef, Vec<f32>)>,
    ) -> Vec<RankedResult> {
        let mut ranked: Vec<RankedResult> = candidates
            .into_iter()
            .map(|(doc, embedding)| {
                let score = vector_similarity(query_embedding, &embedding, &self.vector_metric);
                RankedResult::scored(doc, score)
            })
            .collect();

        sort_descending(&mut ranked);
        ranked
    }

    /// Filter results by minimum score
    pub fn filter_by_score(&self, results: Vec<RankedResult>, min_score: f64) -> Vec<RankedResult> {
        results.into_iter().filter(|r| r.score >= min_score).collect()
    }

    /// Deduplicate results by document (keep highest scoring chunk per document)
    pub fn dedupe_by_document(&self, results: Vec<RankedResult>) -> Vec<RankedResult> {
        let mut by_doc: HashMap<String, RankedResult> = HashMap::new();

        for result in results {
            match by_doc.entry(result.document_key().to_string()) {
                std::collections::hash_map::Entry::Occupied(mut e) => {
                    if result.score > e.get().score {
                        e.insert(result);
                    }
                }
                std::collections::hash_map::Entry::Vacant(e) => {
                    e.insert(result);
                }
            }
        }

        let mut deduped: Vec<RankedResult> = by_doc.into_values().collect();
        sort_descending(&mut deduped);
        deduped
    }
}
