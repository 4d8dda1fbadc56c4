// Per-benchmark regression comparison
//
// Each benchmark moves NoBaseline -> Evaluated{Normal | Anomalous}:
// - SD: anomalous when |current - mean| > k * sample_std_dev. A zero-spread
//   baseline only flags differences beyond a relative epsilon, so float
//   noise is not reported as a regression.
// - DELTA / PERCENT_CHANGE: anomalous when |(current - mean) / mean| * 100
//   exceeds the allowed percent.
// A benchmark without history is never anomalous.

use crate::regression::baseline::BaselineSelection;
use crate::regression::config::{Method, Threshold};
use crate::regression::statistics::{baseline_stats, BaselineStats};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Relative tolerance for zero-spread baselines
pub const STABLE_EPSILON: f64 = 1e-6;

/// Comparison state of one benchmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Evaluation {
    /// No historical scores; unevaluated
    NoBaseline,
    Normal,
    Anomalous,
}

/// Auditable comparison result for one benchmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub benchmark: String,
    /// "SD" or "DELTA"
    pub method: String,
    pub current: f64,
    /// Baseline mean/spread used, absent without history
    pub baseline: Option<BaselineStats>,
    /// SD: distance from the mean in standard deviations.
    /// DELTA: absolute percent change.
    /// Absent when undefined (no history, zero spread, zero mean).
    pub deviation: Option<f64>,
    pub evaluation: Evaluation,
}

impl AnomalyResult {
    pub fn is_anomalous(&self) -> bool {
        self.evaluation == Evaluation::Anomalous
    }
}

/// Applies one statistical method to current scores
#[derive(Debug, Clone)]
pub struct RegressionComparator {
    method: Method,
}

impl RegressionComparator {
    pub fn new(method: Method) -> Self {
        Self { method }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Evaluate one benchmark against its baseline scores
    pub fn evaluate(&self, benchmark: &str, current: f64, baseline: &[f64]) -> AnomalyResult {
        let mut result = AnomalyResult {
            benchmark: benchmark.to_string(),
            method: self.method.name().to_string(),
            current,
            baseline: None,
            deviation: None,
            evaluation: Evaluation::NoBaseline,
        };

        let stats = match baseline_stats(baseline) {
            Ok(stats) => stats,
            Err(e) => {
                if !baseline.is_empty() {
                    tracing::warn!("Unusable baseline for {}: {}", benchmark, e);
                }
                return result;
            }
        };
        result.baseline = Some(stats);

        let difference = current - stats.mean;
        let (anomalous, deviation) = match &self.method {
            Method::StdDev { allowed_deviations } => {
                if stats.std_dev > 0.0 {
                    let z = difference.abs() / stats.std_dev;
                    (z > *allowed_deviations, Some(z))
                } else {
                    let tolerance = STABLE_EPSILON * stats.mean.abs().max(1.0);
                    (difference.abs() > tolerance, None)
                }
            }
            Method::Delta {
                threshold:
                    Threshold::PercentChange {
                        allowed_percent_change,
                    },
            } => {
                if stats.mean != 0.0 {
                    let percent = (difference / stats.mean * 100.0).abs();
                    (percent > *allowed_percent_change, Some(percent))
                } else {
                    (difference.abs() > STABLE_EPSILON, None)
                }
            }
        };

        result.deviation = deviation;
        result.evaluation = if anomalous {
            tracing::info!(
                "Anomaly: {} current={:.4} baseline_mean={:.4} deviation={:?}",
                benchmark,
                current,
                stats.mean,
                deviation
            );
            Evaluation::Anomalous
        } else {
            Evaluation::Normal
        };
        result
    }

    /// Evaluate every current benchmark, in identifier order
    pub fn compare(
        &self,
        current: &BTreeMap<String, f64>,
        baseline: &BaselineSelection,
    ) -> Vec<AnomalyResult> {
        current
            .iter()
            .map(|(benchmark, score)| {
                let history = baseline
                    .scores
                    .get(benchmark)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                self.evaluate(benchmark, *score, history)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sd(k: f64) -> RegressionComparator {
        RegressionComparator::new(Method::StdDev {
            allowed_deviations: k,
        })
    }

    fn delta(percent: f64) -> RegressionComparator {
        RegressionComparator::new(Method::Delta {
            threshold: Threshold::PercentChange {
                allowed_percent_change: percent,
            },
        })
    }

    #[test]
    fn test_sd_constant_baseline_same_score_is_normal() {
        let result = sd(2.0).evaluate("a.B.c", 100.0, &[100.0, 100.0, 100.0, 100.0]);
        assert_eq!(result.evaluation, Evaluation::Normal);
    }

    #[test]
    fn test_sd_constant_baseline_large_change_is_anomalous() {
        let result = sd(2.0).evaluate("a.B.c", 500.0, &[100.0, 100.0, 100.0, 100.0]);
        assert_eq!(result.evaluation, Evaluation::Anomalous);
        assert!(result.deviation.is_none());
    }

    #[test]
    fn test_sd_constant_baseline_ignores_float_noise() {
        let result = sd(2.0).evaluate("a.B.c", 100.000_000_01, &[100.0, 100.0, 100.0]);
        assert_eq!(result.evaluation, Evaluation::Normal);
    }

    #[test]
    fn test_sd_band() {
        // mean 100, sample std dev ~1.633
        let baseline = [98.0, 100.0, 102.0, 100.0];
        let comparator = sd(2.0);
        assert_eq!(
            comparator.evaluate("a.B.c", 101.0, &baseline).evaluation,
            Evaluation::Normal
        );
        let far = comparator.evaluate("a.B.c", 110.0, &baseline);
        assert_eq!(far.evaluation, Evaluation::Anomalous);
        assert!(far.deviation.unwrap() > 2.0);
    }

    #[test]
    fn test_sd_band_at_large_magnitudes() {
        // mean 1e9 + 3, sample std dev 2, z = 8.5
        let baseline = [1_000_000_001.0, 1_000_000_003.0, 1_000_000_005.0];
        let result = sd(2.0).evaluate("a.B.c", 1_000_000_020.0, &baseline);
        assert_eq!(result.evaluation, Evaluation::Anomalous);
        assert!((result.deviation.unwrap() - 8.5).abs() < 1e-3);
        assert_eq!(
            sd(2.0).evaluate("a.B.c", 1_000_000_004.0, &baseline).evaluation,
            Evaluation::Normal
        );
    }

    #[test]
    fn test_sd_flags_improvements_too() {
        let result = sd(2.0).evaluate("a.B.c", 50.0, &[98.0, 100.0, 102.0, 100.0]);
        assert_eq!(result.evaluation, Evaluation::Anomalous);
    }

    #[test]
    fn test_delta_percent_change() {
        let baseline = [100.0, 100.0];
        let comparator = delta(10.0);

        let above = comparator.evaluate("a.B.c", 115.0, &baseline);
        assert_eq!(above.evaluation, Evaluation::Anomalous);
        assert!((above.deviation.unwrap() - 15.0).abs() < 1e-6);

        let within = comparator.evaluate("a.B.c", 105.0, &baseline);
        assert_eq!(within.evaluation, Evaluation::Normal);

        let drop = comparator.evaluate("a.B.c", 85.0, &baseline);
        assert_eq!(drop.evaluation, Evaluation::Anomalous);
    }

    #[test]
    fn test_delta_boundary_is_normal() {
        let result = delta(10.0).evaluate("a.B.c", 110.0, &[100.0]);
        assert_eq!(result.evaluation, Evaluation::Normal);
    }

    #[test]
    fn test_delta_zero_mean() {
        let comparator = delta(10.0);
        assert_eq!(
            comparator.evaluate("a.B.c", 0.0, &[0.0, 0.0]).evaluation,
            Evaluation::Normal
        );
        assert_eq!(
            comparator.evaluate("a.B.c", 5.0, &[0.0, 0.0]).evaluation,
            Evaluation::Anomalous
        );
    }

    #[test]
    fn test_no_baseline_is_never_anomalous() {
        let result = sd(0.1).evaluate("a.B.c", 1e12, &[]);
        assert_eq!(result.evaluation, Evaluation::NoBaseline);
        assert!(result.baseline.is_none());
        assert!(!result.is_anomalous());
    }

    #[test]
    fn test_compare_uses_per_benchmark_history() {
        let current = BTreeMap::from([
            ("a.B.known".to_string(), 500.0),
            ("a.B.new".to_string(), 500.0),
        ]);
        let baseline = BaselineSelection {
            version: "1.0".to_string(),
            requested: 2,
            report_ids: vec!["r1".to_string(), "r2".to_string()],
            scores: BTreeMap::from([("a.B.known".to_string(), vec![100.0, 100.0])]),
        };

        let results = sd(2.0).compare(&current, &baseline);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].benchmark, "a.B.known");
        assert_eq!(results[0].evaluation, Evaluation::Anomalous);
        assert_eq!(results[1].benchmark, "a.B.new");
        assert_eq!(results[1].evaluation, Evaluation::NoBaseline);
    }
}
