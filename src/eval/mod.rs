//! RAG evaluation
//!
//! This module handles:
//! - Retrieval metrics against ground-truth document sets
//! - Lexical generation metrics against reference answers
//! - Heuristic quality criteria
//! - An in-memory result log with batch runs, named benchmarks and reports

mod generation;
mod quality;
mod report;
mod retrieval;

pub use generation::*;
pub use quality::*;
pub use report::*;
pub use retrieval::*;

use crate::config::EvalConfig;
use crate::document::DocumentRef;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Round to 4 decimal places
pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

const RETRIEVAL_WEIGHTS: [(&str, f64); 5] = [
    ("precision", 0.2),
    ("recall", 0.2),
    ("f1_score", 0.3),
    ("mrr", 0.15),
    ("ndcg", 0.15),
];

const GENERATION_WEIGHTS: [(&str, f64); 5] = [
    ("bleu_score", 0.2),
    ("rouge_score", 0.2),
    ("relevance_score", 0.25),
    ("consistency_score", 0.2),
    ("completeness_score", 0.15),
];

/// Equal-weight blend of the weighted retrieval and generation scores
pub fn overall_score(retrieval: &RetrievalMetrics, generation: &GenerationMetrics) -> f64 {
    let retrieval_score: f64 = RETRIEVAL_WEIGHTS
        .iter()
        .map(|(name, weight)| retrieval.get(name) * weight)
        .sum();
    let generation_score: f64 = GENERATION_WEIGHTS
        .iter()
        .map(|(name, weight)| generation.get(name) * weight)
        .sum();

    round4((retrieval_score + generation_score) / 2.0)
}

/// One query/response pair to evaluate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationInput {
    pub query: String,

    #[serde(default)]
    pub retrieved_docs: Vec<DocumentRef>,

    #[serde(default)]
    pub generated_answer: String,

    #[serde(default)]
    pub reference_answer: Option<String>,

    /// Ground truth for retrieval metrics
    #[serde(default)]
    pub relevant_docs: Option<Vec<DocumentRef>>,

    /// Documents the answer was generated from
    #[serde(default)]
    pub context: Option<Vec<DocumentRef>>,

    /// Cut-off for precision/recall/NDCG; the evaluator's default when unset
    #[serde(default)]
    pub k: Option<usize>,
}

/// Counts recorded alongside every result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EvaluationMetadata {
    pub retrieved_docs_count: usize,
    pub context_docs_count: usize,
    /// Answer length in characters
    pub answer_length: usize,
}

/// Score sheet for one query/response pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub query: String,
    pub timestamp: DateTime<Utc>,
    /// Present when relevant documents were supplied
    pub retrieval_metrics: Option<RetrievalMetrics>,
    /// Present when a reference answer and context were supplied
    pub generation_metrics: Option<GenerationMetrics>,
    /// Present when both metric groups are
    pub overall_score: Option<f64>,
    pub quality_metrics: BTreeMap<String, f64>,
    pub metadata: EvaluationMetadata,
}

/// Output of [`Evaluator::evaluate_batch`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEvaluation {
    pub batch_report: BenchmarkReport,
    pub individual_results: Vec<EvaluationResult>,
    pub total_evaluations: usize,
    pub timestamp: DateTime<Utc>,
}

/// A named benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub benchmark_name: String,
    /// Free-form description of the system under test
    pub system_config: Value,
    pub evaluation_report: BenchmarkReport,
    pub timestamp: DateTime<Utc>,
    pub total_queries: usize,
}

/// Side-by-side means of stored benchmarks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    /// Benchmarks found, in request order
    pub benchmarks: Vec<String>,
    pub comparison_date: DateTime<Utc>,
    pub retrieval: BTreeMap<String, RetrievalMetrics>,
    pub generation: BTreeMap<String, GenerationMetrics>,
    /// Highest mean F1
    pub best_retrieval: Option<String>,
    /// Highest mean relevance
    pub best_generation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreSet<T> {
    pub retrieval_f1: T,
    pub generation_relevance: T,
    pub quality: T,
}

/// Overview of everything in the result log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub total_evaluations: usize,
    pub average_scores: ScoreSet<f64>,
    pub score_ranges: ScoreSet<ScoreRange>,
    pub benchmarks_count: usize,
    pub last_evaluation: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct EvaluationExport<'a> {
    evaluation_results: &'a [EvaluationResult],
    benchmark_results: &'a BTreeMap<String, Benchmark>,
    summary: EvaluationSummary,
    export_timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
struct EvaluationImport {
    #[serde(default)]
    evaluation_results: Vec<EvaluationResult>,
    #[serde(default)]
    benchmark_results: BTreeMap<String, Benchmark>,
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn range(values: &[f64]) -> ScoreRange {
    if values.is_empty() {
        return ScoreRange::default();
    }
    ScoreRange {
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

fn check_format(format: &str) -> Result<()> {
    if format.eq_ignore_ascii_case("json") {
        Ok(())
    } else {
        Err(Error::UnsupportedFormat(format.to_string()))
    }
}

/// Scores RAG responses and keeps an append-only log of the results
///
/// The log is owned by this instance; share it across threads only behind
/// external synchronization.
pub struct Evaluator {
    config: EvalConfig,
    policy: Box<dyn ContradictionPolicy>,
    results: Vec<EvaluationResult>,
    benchmarks: BTreeMap<String, Benchmark>,
}

impl Evaluator {
    /// Create an evaluator with the no-op contradiction policy
    pub fn new(config: EvalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            policy: Box::new(NeverContradicts),
            results: Vec::new(),
            benchmarks: BTreeMap::new(),
        })
    }

    /// Replace the contradiction policy used for `consistency_score`
    pub fn with_policy(mut self, policy: impl ContradictionPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Results logged so far, oldest first
    pub fn results(&self) -> &[EvaluationResult] {
        &self.results
    }

    pub fn benchmark(&self, name: &str) -> Option<&Benchmark> {
        self.benchmarks.get(name)
    }

    /// Score one query/response pair and append it to the log
    pub fn evaluate(&mut self, input: &EvaluationInput) -> EvaluationResult {
        let k = input.k.unwrap_or(self.config.default_k);

        let retrieval_metrics = input
            .relevant_docs
            .as_deref()
            .filter(|relevant| !relevant.is_empty())
            .map(|relevant| score_retrieval(&input.query, &input.retrieved_docs, relevant, k));

        let reference = input.reference_answer.as_deref().filter(|r| !r.is_empty());
        let context = input.context.as_deref().filter(|c| !c.is_empty());
        let generation_metrics = match (reference, context) {
            (Some(reference), Some(context)) => Some(score_generation_with(
                &input.generated_answer,
                reference,
                context,
                self.policy.as_ref(),
            )),
            _ => None,
        };

        let overall = match (&retrieval_metrics, &generation_metrics) {
            (Some(r), Some(g)) => Some(overall_score(r, g)),
            _ => None,
        };

        let result = EvaluationResult {
            query: input.query.clone(),
            timestamp: Utc::now(),
            retrieval_metrics,
            generation_metrics,
            overall_score: overall,
            quality_metrics: score_quality(&input.generated_answer, &self.config.quality_criteria),
            metadata: EvaluationMetadata {
                retrieved_docs_count: input.retrieved_docs.len(),
                context_docs_count: input.context.as_ref().map_or(0, Vec::len),
                answer_length: input.generated_answer.chars().count(),
            },
        };

        debug!(
            "Evaluated query {:?} (retrieval: {}, generation: {})",
            result.query,
            result.retrieval_metrics.is_some(),
            result.generation_metrics.is_some()
        );

        self.results.push(result.clone());
        result
    }

    /// Evaluate every input and report over this batch only
    pub fn evaluate_batch(&mut self, inputs: &[EvaluationInput]) -> BatchEvaluation {
        let individual_results: Vec<EvaluationResult> =
            inputs.iter().map(|input| self.evaluate(input)).collect();

        info!("Evaluated batch of {} queries", individual_results.len());

        BatchEvaluation {
            batch_report: report_with_thresholds(&individual_results, &self.config.thresholds),
            total_evaluations: individual_results.len(),
            individual_results,
            timestamp: Utc::now(),
        }
    }

    /// Evaluate `inputs` as a named benchmark, replacing any earlier run
    pub fn run_benchmark(
        &mut self,
        name: &str,
        inputs: &[EvaluationInput],
        system_config: Value,
    ) -> &Benchmark {
        let results: Vec<EvaluationResult> =
            inputs.iter().map(|input| self.evaluate(input)).collect();

        let benchmark = Benchmark {
            benchmark_name: name.to_string(),
            system_config,
            evaluation_report: report_with_thresholds(&results, &self.config.thresholds),
            timestamp: Utc::now(),
            total_queries: inputs.len(),
        };

        info!("Benchmark {} ran {} queries", name, inputs.len());

        self.benchmarks.insert(name.to_string(), benchmark);
        &self.benchmarks[name]
    }

    /// Compare stored benchmarks by their per-metric means
    ///
    /// Unknown names are skipped with a warning. Ties for best go to the
    /// benchmark named first.
    pub fn compare_benchmarks(&self, names: &[&str]) -> Result<BenchmarkComparison> {
        if names.is_empty() {
            return Err(Error::InvalidInput("No benchmark names provided".to_string()));
        }

        let mut found: Vec<(&str, &Benchmark)> = Vec::new();
        for name in names {
            match self.benchmarks.get(*name) {
                Some(benchmark) => found.push((*name, benchmark)),
                None => warn!("Benchmark '{}' not found", name),
            }
        }

        if found.is_empty() {
            return Err(Error::BenchmarkNotFound(names.join(", ")));
        }

        let mut retrieval = BTreeMap::new();
        let mut generation = BTreeMap::new();
        let mut best_retrieval: Option<(&str, f64)> = None;
        let mut best_generation: Option<(&str, f64)> = None;

        for &(name, benchmark) in &found {
            let report = &benchmark.evaluation_report;

            if report.metrics.contains_key("retrieval") {
                let means = RetrievalMetrics::from_fn(|metric| {
                    report.mean("retrieval", metric).unwrap_or(0.0)
                });
                if best_retrieval.map_or(true, |(_, top)| means.f1_score > top) {
                    best_retrieval = Some((name, means.f1_score));
                }
                retrieval.insert(name.to_string(), means);
            }

            if report.metrics.contains_key("generation") {
                let means = GenerationMetrics::from_fn(|metric| {
                    report.mean("generation", metric).unwrap_or(0.0)
                });
                if best_generation.map_or(true, |(_, top)| means.relevance_score > top) {
                    best_generation = Some((name, means.relevance_score));
                }
                generation.insert(name.to_string(), means);
            }
        }

        Ok(BenchmarkComparison {
            benchmarks: found.iter().map(|(name, _)| name.to_string()).collect(),
            comparison_date: Utc::now(),
            retrieval,
            generation,
            best_retrieval: best_retrieval.map(|(name, _)| name.to_string()),
            best_generation: best_generation.map(|(name, _)| name.to_string()),
        })
    }

    /// Averages and ranges of the headline scores across the log
    pub fn summary(&self) -> EvaluationSummary {
        let mut retrieval_f1 = Vec::new();
        let mut generation_relevance = Vec::new();
        let mut quality = Vec::new();

        for result in &self.results {
            if let Some(r) = &result.retrieval_metrics {
                retrieval_f1.push(r.f1_score);
            }
            if let Some(g) = &result.generation_metrics {
                generation_relevance.push(g.relevance_score);
            }
            if !result.quality_metrics.is_empty() {
                quality.push(average(
                    &result.quality_metrics.values().copied().collect::<Vec<_>>(),
                ));
            }
        }

        EvaluationSummary {
            total_evaluations: self.results.len(),
            average_scores: ScoreSet {
                retrieval_f1: average(&retrieval_f1),
                generation_relevance: average(&generation_relevance),
                quality: average(&quality),
            },
            score_ranges: ScoreSet {
                retrieval_f1: range(&retrieval_f1),
                generation_relevance: range(&generation_relevance),
                quality: range(&quality),
            },
            benchmarks_count: self.benchmarks.len(),
            last_evaluation: self.results.last().map(|r| r.timestamp),
        }
    }

    /// Serialize the log, benchmarks and summary (only `json` is supported)
    pub fn export(&self, format: &str) -> Result<String> {
        check_format(format)?;

        let export = EvaluationExport {
            evaluation_results: &self.results,
            benchmark_results: &self.benchmarks,
            summary: self.summary(),
            export_timestamp: Utc::now(),
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Append results and merge benchmarks from a previous export
    pub fn import(&mut self, data: &str, format: &str) -> Result<()> {
        check_format(format)?;

        let imported: EvaluationImport = serde_json::from_str(data)?;
        let (results, benchmarks) = (
            imported.evaluation_results.len(),
            imported.benchmark_results.len(),
        );

        self.results.extend(imported.evaluation_results);
        self.benchmarks.extend(imported.benchmark_results);

        info!("Imported {} evaluation results and {} benchmarks", results, benchmarks);
        Ok(())
    }

    /// Drop every logged result and benchmark
    pub fn clear(&mut self) {
        self.results.clear();
        self.benchmarks.clear();
        info!("Evaluation results cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(ids: &[&str]) -> Vec<DocumentRef> {
        ids.iter().map(|id| DocumentRef::new(*id, format!("content of {}", id))).collect()
    }

    fn evaluator() -> Evaluator {
        Evaluator::new(EvalConfig::default()).unwrap()
    }

    fn full_input(query: &str, relevant: &[&str]) -> EvaluationInput {
        EvaluationInput {
            query: query.to_string(),
            retrieved_docs: docs(&["a", "b", "c"]),
            generated_answer: "Rust ownership prevents data races".to_string(),
            reference_answer: Some(
                "Rust ownership prevents data races at compile time".to_string(),
            ),
            relevant_docs: Some(docs(relevant)),
            context: Some(vec![DocumentRef::new("a", "Ownership in Rust prevents data races")]),
            k: None,
        }
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(1.0 / 3.0), 0.3333);
        assert_eq!(round4(0.66666), 0.6667);
    }

    #[test]
    fn test_overall_score_weights() {
        let perfect_retrieval = RetrievalMetrics {
            precision: 1.0,
            recall: 1.0,
            f1_score: 1.0,
            mrr: 1.0,
            ndcg: 1.0,
        };
        assert_eq!(overall_score(&perfect_retrieval, &GenerationMetrics::default()), 0.5);
    }

    #[test]
    fn test_evaluate_full() {
        let mut evaluator = evaluator();
        let result = evaluator.evaluate(&full_input("q", &["b"]));

        let retrieval = result.retrieval_metrics.unwrap();
        assert_eq!(retrieval.precision, 0.3333);
        assert_eq!(retrieval.mrr, 0.5);
        assert!(result.generation_metrics.is_some());
        assert!(result.overall_score.is_some());
        assert_eq!(result.quality_metrics.len(), 3);
        assert_eq!(result.metadata.retrieved_docs_count, 3);
        assert_eq!(result.metadata.context_docs_count, 1);
        assert_eq!(evaluator.results().len(), 1);
    }

    #[test]
    fn test_evaluate_partial_inputs() {
        let mut evaluator = evaluator();
        let input = EvaluationInput {
            query: "q".to_string(),
            generated_answer: "An answer".to_string(),
            reference_answer: Some("A reference".to_string()),
            relevant_docs: Some(Vec::new()),
            ..Default::default()
        };

        let result = evaluator.evaluate(&input);
        assert!(result.retrieval_metrics.is_none());
        assert!(result.generation_metrics.is_none());
        assert!(result.overall_score.is_none());
        assert!(!result.quality_metrics.is_empty());
    }

    #[test]
    fn test_input_k_overrides_default() {
        let mut evaluator = evaluator();
        let mut input = full_input("q", &["c"]);
        input.k = Some(2);

        let retrieval = evaluator.evaluate(&input).retrieval_metrics.unwrap();
        assert_eq!(retrieval.recall, 0.0);
        assert_eq!(retrieval.mrr, 0.3333);
    }

    #[test]
    fn test_policy_is_pluggable() {
        struct Everything;
        impl ContradictionPolicy for Everything {
            fn is_contradictory(&self, _: &str, _: &[String]) -> bool {
                true
            }
        }

        let mut evaluator = evaluator().with_policy(Everything);
        let mut input = full_input("q", &["a"]);
        input.generated_answer = "Released in 2004".to_string();
        input.context = Some(vec![DocumentRef::new("a", "Released in 1999")]);

        let generation = evaluator.evaluate(&input).generation_metrics.unwrap();
        assert_eq!(generation.consistency_score, 0.0);
    }

    #[test]
    fn test_batch_and_summary() {
        let mut evaluator = evaluator();
        let batch = evaluator.evaluate_batch(&[full_input("q1", &["a"]), full_input("q2", &["z"])]);

        assert_eq!(batch.total_evaluations, 2);
        assert_eq!(batch.batch_report.total_queries, 2);
        assert_eq!(batch.batch_report.mean("retrieval", "mrr"), Some(0.5));

        let summary = evaluator.summary();
        assert_eq!(summary.total_evaluations, 2);
        assert_eq!(summary.score_ranges.retrieval_f1.min, 0.0);
        assert_eq!(summary.score_ranges.retrieval_f1.max, 0.5);
        assert_eq!(summary.average_scores.retrieval_f1, 0.25);
        assert!(summary.last_evaluation.is_some());
    }

    #[test]
    fn test_empty_summary() {
        let summary = evaluator().summary();
        assert_eq!(summary.total_evaluations, 0);
        assert_eq!(summary.average_scores, ScoreSet::default());
        assert_eq!(summary.last_evaluation, None);
    }

    #[test]
    fn test_benchmarks_compare() {
        let mut evaluator = evaluator();
        evaluator.run_benchmark("weak", &[full_input("q", &["z"])], json!({"model": "small"}));
        let strong = evaluator.run_benchmark("strong", &[full_input("q", &["a"])], json!({}));
        assert_eq!(strong.total_queries, 1);

        let comparison = evaluator.compare_benchmarks(&["weak", "missing", "strong"]).unwrap();
        assert_eq!(comparison.benchmarks, vec!["weak", "strong"]);
        assert_eq!(comparison.best_retrieval.as_deref(), Some("strong"));
        assert_eq!(comparison.best_generation.as_deref(), Some("weak"));
        assert_eq!(comparison.retrieval["weak"].f1_score, 0.0);

        assert!(matches!(
            evaluator.compare_benchmarks(&["missing"]),
            Err(Error::BenchmarkNotFound(_))
        ));
        assert!(matches!(
            evaluator.compare_benchmarks(&[]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_export_import_clear() {
        let mut evaluator = evaluator();
        evaluator.evaluate(&full_input("q", &["a"]));
        evaluator.run_benchmark("bench", &[full_input("q", &["b"])], json!(null));

        let exported = evaluator.export("JSON").unwrap();
        assert!(matches!(evaluator.export("xml"), Err(Error::UnsupportedFormat(_))));

        let mut other = Evaluator::new(EvalConfig::default()).unwrap();
        other.import(&exported, "json").unwrap();
        assert_eq!(other.results().len(), 2);
        assert!(other.benchmark("bench").is_some());
        assert_eq!(other.results()[0].query, "q");
        assert!(other.results()[1].retrieval_metrics.is_some());

        other.clear();
        assert!(other.results().is_empty());
        assert_eq!(other.summary().benchmarks_count, 0);
    }

    #[test]
    fn test_import_rejects_bad_json() {
        let mut evaluator = evaluator();
        assert!(matches!(evaluator.import("not json", "json"), Err(Error::Json(_))));
    }
}
