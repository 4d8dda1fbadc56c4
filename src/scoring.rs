//! Score aggregation
//!
//! Folds validated measurements into per-benchmark, per-category and overall
//! scores. Categories and the overall score use the geometric mean, so a
//! benchmark reporting in millions of ops/s does not drown out one reporting
//! in tens.
//!
//! Properties relied on downstream:
//! - commutative: input order never changes a score
//! - monotonic: raising one score never lowers its category or the overall
//! - empty input yields [`EMPTY_SCORE`], never a division error

use crate::measurement::{MalformedMeasurement, Measurement};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Score of an empty category or an empty run
pub const EMPTY_SCORE: f64 = 0.0;

/// Geometric mean of non-negative scores
///
/// Any zero score makes the result zero. Logs are summed in sorted order so
/// the result is bit-identical for every permutation of `scores`.
///
/// # Example
/// ```
/// use benchgate::scoring::combine;
///
/// assert_eq!(combine(&[]), 0.0);
/// assert!((combine(&[1.0, 100.0]) - 10.0).abs() < 1e-9);
/// ```
pub fn combine(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return EMPTY_SCORE;
    }
    if scores.iter().any(|s| *s == 0.0) {
        return 0.0;
    }
    if let [only] = scores {
        return *only;
    }

    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);

    let log_sum: f64 = sorted.iter().map(|s| s.ln()).sum();
    (log_sum / sorted.len() as f64).exp()
}

/// Rejected measurement with the reason it was excluded
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    pub identifier: String,
    pub reason: MalformedMeasurement,
}

/// Aggregated scores for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    /// Benchmark identifier → score
    pub per_benchmark: BTreeMap<String, f64>,
    /// Category → combined score
    pub per_category: BTreeMap<String, f64>,
    /// Category → member benchmark identifiers (sorted)
    pub members: BTreeMap<String, Vec<String>>,
    /// Measurements that passed validation, in input order
    #[serde(skip)]
    pub accepted: Vec<Measurement>,
    /// Combined score across categories
    pub overall: f64,
    #[serde(skip)]
    pub rejected: Vec<Rejected>,
}

impl ScoreSummary {
    /// Category a benchmark was aggregated under
    pub fn category_of(&self, identifier: &str) -> Option<&str> {
        self.members
            .iter()
            .find(|(_, ids)| ids.iter().any(|id| id == identifier))
            .map(|(category, _)| category.as_str())
    }
}

/// Folds measurements into scores
#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator;

impl ScoreAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate measurements, excluding malformed ones
    ///
    /// A repeated identifier keeps its first occurrence; later ones are
    /// rejected as duplicates.
    pub fn aggregate(&self, measurements: &[Measurement]) -> ScoreSummary {
        let mut summary = ScoreSummary::default();
        let mut seen = BTreeSet::new();
        let mut by_category: BTreeMap<String, Vec<f64>> = BTreeMap::new();

        for measurement in measurements {
            let verdict = measurement.validate().and_then(|()| {
                if seen.contains(&measurement.identifier) {
                    Err(MalformedMeasurement::Duplicate)
                } else {
                    Ok(())
                }
            });

            if let Err(reason) = verdict {
                tracing::warn!(
                    "Excluding malformed measurement {}: {}",
                    measurement.identifier,
                    reason
                );
                summary.rejected.push(Rejected {
                    identifier: measurement.identifier.clone(),
                    reason,
                });
                continue;
            }

            seen.insert(measurement.identifier.clone());
            let category = measurement.category().to_string();
            summary
                .per_benchmark
                .insert(measurement.identifier.clone(), measurement.score);
            by_category
                .entry(category.clone())
                .or_default()
                .push(measurement.score);
            summary
                .members
                .entry(category)
                .or_default()
                .push(measurement.identifier.clone());
            summary.accepted.push(measurement.clone());
        }

        for ids in summary.members.values_mut() {
            ids.sort();
        }

        summary.per_category = by_category
            .iter()
            .map(|(category, scores)| (category.clone(), combine(scores)))
            .collect();

        let category_scores: Vec<f64> = summary.per_category.values().copied().collect();
        summary.overall = combine(&category_scores);

        tracing::debug!(
            "Aggregated {} benchmarks into {} categories (overall {:.4}, {} rejected)",
            summary.per_benchmark.len(),
            summary.per_category.len(),
            summary.overall,
            summary.rejected.len()
        );

        summary
    }
}
