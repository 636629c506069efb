//! Aggregate reports over many evaluation results

use super::{round4, EvaluationResult};
use crate::config::ThresholdConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-metric statistics, rounded to 4 decimals
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation (n - 1 denominator); 0 below two values
    pub std: f64,
}

impl MetricStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            mean: round4(mean),
            min: round4(min),
            max: round4(max),
            std: round4(sample_std(values, mean)),
        }
    }
}

fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let variance =
        values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Category name -> metric name -> stats
pub type MetricTable = BTreeMap<String, BTreeMap<String, MetricStats>>;

/// Aggregation over a set of evaluation results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub total_queries: usize,
    pub evaluation_date: DateTime<Utc>,
    /// Categories: `retrieval`, `generation`, `quality`, `overall`; a
    /// category only appears when at least one result carried it
    pub metrics: MetricTable,
    pub recommendations: Vec<String>,
}

impl BenchmarkReport {
    /// Mean of one metric, if that category and metric were observed
    pub fn mean(&self, category: &str, metric: &str) -> Option<f64> {
        self.metrics
            .get(category)
            .and_then(|metrics| metrics.get(metric))
            .map(|stats| stats.mean)
    }
}

/// Build a report with the default recommendation thresholds
pub fn report(results: &[EvaluationResult]) -> BenchmarkReport {
    report_with_thresholds(results, &ThresholdConfig::default())
}

/// Build a report, deriving recommendations from `thresholds`
pub fn report_with_thresholds(
    results: &[EvaluationResult],
    thresholds: &ThresholdConfig,
) -> BenchmarkReport {
    let mut values: BTreeMap<String, BTreeMap<String, Vec<f64>>> = BTreeMap::new();
    let mut push = |category: &str, metric: &str, value: f64| {
        values
            .entry(category.to_string())
            .or_default()
            .entry(metric.to_string())
            .or_default()
            .push(value);
    };

    for result in results {
        if let Some(retrieval) = &result.retrieval_metrics {
            for (name, value) in retrieval.pairs() {
                push("retrieval", name, value);
            }
        }
        if let Some(generation) = &result.generation_metrics {
            for (name, value) in generation.pairs() {
                push("generation", name, value);
            }
        }
        for (name, value) in &result.quality_metrics {
            push("quality", name, *value);
        }
        if let Some(overall) = result.overall_score {
            push("overall", "overall_score", overall);
        }
    }

    let metrics: MetricTable = values
        .into_iter()
        .map(|(category, metrics)| {
            let stats = metrics
                .into_iter()
                .map(|(name, values)| (name, MetricStats::from_values(&values)))
                .collect();
            (category, stats)
        })
        .collect();

    let recommendations = if results.is_empty() {
        Vec::new()
    } else {
        recommendations(&metrics, thresholds)
    };

    BenchmarkReport {
        total_queries: results.len(),
        evaluation_date: Utc::now(),
        metrics,
        recommendations,
    }
}

fn recommendations(metrics: &MetricTable, thresholds: &ThresholdConfig) -> Vec<String> {
    let mean = |category: &str, metric: &str| {
        metrics
            .get(category)
            .map(|m| m.get(metric).map_or(0.0, |s| s.mean))
    };

    let checks = [
        (
            mean("retrieval", "precision"),
            thresholds.precision,
            "Consider improving retrieval precision by refining search algorithms or embeddings",
        ),
        (
            mean("retrieval", "recall"),
            thresholds.recall,
            "Consider improving retrieval recall by expanding search scope or improving indexing",
        ),
        (
            mean("generation", "consistency_score"),
            thresholds.consistency,
            "Consider improving factual consistency by enhancing context understanding",
        ),
        (
            mean("generation", "relevance_score"),
            thresholds.relevance,
            "Consider improving answer relevance by better prompt engineering",
        ),
    ];

    let mut out: Vec<String> = checks
        .into_iter()
        .filter_map(|(value, threshold, text)| match value {
            Some(v) if v < threshold => Some(text.to_string()),
            _ => None,
        })
        .collect();

    if out.is_empty() {
        out.push(
            "System performance is good. Consider fine-tuning for specific use cases".to_string(),
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{EvaluationMetadata, GenerationMetrics, RetrievalMetrics};

    fn result(precision: f64, relevance: Option<f64>) -> EvaluationResult {
        EvaluationResult {
            query: "q".to_string(),
            timestamp: Utc::now(),
            retrieval_metrics: Some(RetrievalMetrics {
                precision,
                recall: 1.0,
                f1_score: 0.5,
                mrr: 1.0,
                ndcg: 1.0,
            }),
            generation_metrics: relevance.map(|relevance_score| GenerationMetrics {
                relevance_score,
                consistency_score: 1.0,
                ..Default::default()
            }),
            overall_score: None,
            quality_metrics: BTreeMap::from([("clarity".to_string(), 1.0)]),
            metadata: EvaluationMetadata::default(),
        }
    }

    #[test]
    fn test_metric_stats() {
        let stats = MetricStats::from_values(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.std, 1.291);

        assert_eq!(MetricStats::from_values(&[0.7]).std, 0.0);
        assert_eq!(MetricStats::from_values(&[]), MetricStats::default());
    }

    #[test]
    fn test_report_categories() {
        let report = report(&[result(0.2, None), result(0.4, Some(0.9))]);

        assert_eq!(report.total_queries, 2);
        assert_eq!(report.mean("retrieval", "precision"), Some(0.3));
        assert_eq!(report.mean("generation", "relevance_score"), Some(0.9));
        assert_eq!(report.mean("quality", "clarity"), Some(1.0));
        assert!(!report.metrics.contains_key("overall"));
        assert_eq!(
            report.recommendations,
            vec![
                "Consider improving retrieval precision by refining search algorithms or embeddings"
            ]
        );
    }

    #[test]
    fn test_report_all_good() {
        let report = report(&[result(0.9, Some(0.9))]);
        assert_eq!(report.recommendations.len(), 1);
        assert!(report.recommendations[0].starts_with("System performance is good"));
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = ThresholdConfig {
            relevance: 0.95,
            ..ThresholdConfig::default()
        };
        let report = report_with_thresholds(&[result(0.9, Some(0.9))], &thresholds);
        assert_eq!(
            report.recommendations,
            vec!["Consider improving answer relevance by better prompt engineering"]
        );
    }

    #[test]
    fn test_empty_report() {
        let report = report(&[]);
        assert_eq!(report.total_queries, 0);
        assert!(report.metrics.is_empty());
        assert!(report.recommendations.is_empty());
    }
}
