//! Default values for configuration

/// Default target chunk size in whitespace tokens
pub fn default_chunk_size() -> usize {
    1000
}

/// Default minimum tokens a chunk must carry to survive validation
pub fn default_min_chunk_size() -> usize {
    100
}

/// Default maximum tokens before a chunk is re-split
pub fn default_max_chunk_size() -> usize {
    2000
}

/// Default number of sentences carried into the next text chunk
pub fn default_overlap_sentences() -> usize {
    2
}

/// Default number of lines carried into the next line-window chunk
pub fn default_overlap_lines() -> usize {
    5
}

/// Default: detect programming language from content
pub fn default_language_detection() -> bool {
    true
}

/// Default: honour structural boundaries (syntax tree, patterns, headings)
pub fn default_semantic_boundaries() -> bool {
    true
}

/// Default cut-off for precision@k / recall@k
pub fn default_eval_k() -> usize {
    10
}

/// Default quality criteria scored for every evaluated answer
pub fn default_quality_criteria() -> Vec<String> {
    vec![
        "clarity".to_string(),
        "conciseness".to_string(),
        "helpfulness".to_string(),
    ]
}

/// Mean precision below this triggers a recommendation
pub fn default_precision_threshold() -> f64 {
    0.5
}

/// Mean recall below this triggers a recommendation
pub fn default_recall_threshold() -> f64 {
    0.5
}

/// Mean consistency score below this triggers a recommendation
pub fn default_consistency_threshold() -> f64 {
    0.7
}

/// Mean relevance score below this triggers a recommendation
pub fn default_relevance_threshold() -> f64 {
    0.7
}
