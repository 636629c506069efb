//! Evaluate command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use crate::eval::{BatchEvaluation, BenchmarkReport, EvaluationInput, Evaluator};
use anyhow::Context;
use std::path::Path;
use tracing::info;

/// Read evaluation inputs: a JSON array, or a single JSON object
pub fn read_inputs(path: &Path) -> Result<Vec<EvaluationInput>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&data)?;

    let inputs = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value)?,
        serde_json::Value::Object(_) => vec![serde_json::from_value(value)?],
        _ => {
            return Err(Error::InvalidInput(format!(
                "{} must contain a JSON object or array of objects",
                path.display()
            )))
        }
    };

    Ok(inputs)
}

/// Evaluate every input in a file as one batch
pub fn cmd_evaluate(config: &Config, path: &Path) -> Result<BatchEvaluation> {
    let inputs = read_inputs(path)?;
    info!("Evaluating {} inputs from {}", inputs.len(), path.display());

    let mut evaluator = Evaluator::new(config.eval.clone())?;
    Ok(evaluator.evaluate_batch(&inputs))
}

fn print_report(report: &BenchmarkReport) {
    for (category, metrics) in &report.metrics {
        println!("{}:", category);
        for (name, stats) in metrics {
            println!(
                "  {:<20} mean {:.4}  min {:.4}  max {:.4}  std {:.4}",
                name, stats.mean, stats.min, stats.max, stats.std
            );
        }
    }

    if !report.recommendations.is_empty() {
        println!("\nRecommendations:");
        for recommendation in &report.recommendations {
            println!("  • {}", recommendation);
        }
    }
}

/// Print a batch evaluation to console
pub fn print_batch_report(batch: &BatchEvaluation) {
    println!("\n📊 Evaluation Report\n");
    println!("Queries: {}", batch.total_evaluations);

    if batch.total_evaluations == 0 {
        println!("Nothing to evaluate.");
        return;
    }

    println!();
    print_report(&batch.batch_report);

    println!("\nPer query:");
    for result in &batch.individual_results {
        let overall = result
            .overall_score
            .map(|s| format!("{:.4}", s))
            .unwrap_or_else(|| "-".to_string());
        println!("  {} (overall {})", result.query, overall);
    }
}
