// Regression assessment for one run
//
// This module integrates:
// - Baseline selection (history store, most recent first)
// - Per-benchmark comparison (SD band or percent change)
// - The anomaly gate
//
// to produce an auditable ComparisonOutcome that is stored in the report.

use crate::error::{HistoryError, RunWarning};
use crate::regression::baseline::{select_baseline, HistoryStore};
use crate::regression::comparator::{AnomalyResult, Evaluation, RegressionComparator};
use crate::regression::config::{ComparisonConfig, Method, Scope, Threshold};
use crate::regression::gate::{AnomalyGate, GateVerdict};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full comparison result for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonOutcome {
    /// Configuration used for assessment
    pub config: ComparisonConfig,
    /// Version the baseline was drawn from
    pub baseline_version: String,
    /// Baseline report ids, most recent first
    pub baseline_reports: Vec<String>,
    /// Per-benchmark results, in identifier order
    pub results: Vec<AnomalyResult>,
    pub verdict: GateVerdict,
    /// Recoverable conditions met while comparing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<RunWarning>,
}

impl ComparisonOutcome {
    pub fn anomalous(&self) -> impl Iterator<Item = &AnomalyResult> {
        self.results.iter().filter(|r| r.is_anomalous())
    }

    pub fn unevaluated(&self) -> impl Iterator<Item = &AnomalyResult> {
        self.results
            .iter()
            .filter(|r| r.evaluation == Evaluation::NoBaseline)
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        match &self.verdict {
            GateVerdict::Pass { anomalies, allowed } => {
                report.push_str(&format!(
                    "✅ NO REGRESSION ({} anomalies, {} allowed)\n",
                    anomalies, allowed
                ));
            }
            GateVerdict::Fail {
                anomalies,
                allowed,
                offenders,
            } => {
                report.push_str(&format!(
                    "❌ REGRESSION DETECTED ({} anomalies, {} allowed)\n",
                    anomalies, allowed
                ));
                report.push_str(&format!("Anomalous benchmarks: {}\n", offenders.join(", ")));
            }
        }

        let scope = match &self.config.scope {
            Scope::Within => "WITHIN".to_string(),
            Scope::Between { compare_version } => format!("BETWEEN {}", compare_version),
        };
        let method = match &self.config.method {
            Method::StdDev { allowed_deviations } => format!("SD (k={})", allowed_deviations),
            Method::Delta {
                threshold:
                    Threshold::PercentChange {
                        allowed_percent_change,
                    },
            } => format!("DELTA (±{}%)", allowed_percent_change),
        };
        report.push_str(&format!(
            "Scope: {}, method: {}, baseline: {} of {} reports from {}\n",
            scope,
            method,
            self.baseline_reports.len(),
            self.config.baseline_reports,
            self.baseline_version
        ));

        for warning in &self.warnings {
            report.push_str(&format!("⚠️  {}\n", warning));
        }

        if !self.results.is_empty() {
            report.push_str("\n📊 Comparisons:\n");
            for result in &self.results {
                let marker = match result.evaluation {
                    Evaluation::Anomalous => "ANOMALY",
                    Evaluation::Normal => "ok",
                    Evaluation::NoBaseline => "no baseline",
                };
                match &result.baseline {
                    Some(stats) => report.push_str(&format!(
                        "  {} [{}] current={:.3} mean={:.3} sd={:.3} n={}\n",
                        result.benchmark,
                        marker,
                        result.current,
                        stats.mean,
                        stats.std_dev,
                        stats.count
                    )),
                    None => report.push_str(&format!(
                        "  {} [{}] current={:.3}\n",
                        result.benchmark, marker, result.current
                    )),
                }
            }
        }

        report
    }
}

/// Assess regression of current scores against history
///
/// # Example
/// ```
/// use benchgate::regression::{
///     assess_regression, ComparisonConfig, HistoryRecord, InMemoryHistory, Method, Scope,
/// };
/// use std::collections::BTreeMap;
///
/// let config = ComparisonConfig {
///     scope: Scope::Within,
///     method: Method::StdDev { allowed_deviations: 2.0 },
///     baseline_reports: 3,
///     allowed_anomalies: 1,
/// };
/// let history = InMemoryHistory::new(vec![HistoryRecord {
///     report_id: "r1".to_string(),
///     project: "demo".to_string(),
///     version: "1.0".to_string(),
///     timestamp: 1,
///     scores: BTreeMap::from([("a.B.c".to_string(), 100.0)]),
/// }]);
/// let current = BTreeMap::from([("a.B.c".to_string(), 100.0)]);
///
/// let outcome = assess_regression(&config, &current, "demo", "1.0", None, &history).unwrap();
/// assert!(outcome.verdict.is_pass());
/// ```
pub fn assess_regression(
    config: &ComparisonConfig,
    current: &BTreeMap<String, f64>,
    project: &str,
    version: &str,
    exclude_report: Option<&str>,
    store: &dyn HistoryStore,
) -> Result<ComparisonOutcome, HistoryError> {
    // Step 1: Select baseline
    let baseline = select_baseline(config, project, version, exclude_report, store)?;
    let warnings: Vec<RunWarning> = baseline.shortfall().into_iter().collect();

    // Step 2: Compare each benchmark
    let comparator = RegressionComparator::new(config.method.clone());
    let results = comparator.compare(current, &baseline);

    // Step 3: Gate
    let verdict = AnomalyGate::new(config.allowed_anomalies).gate(&results);

    Ok(ComparisonOutcome {
        config: config.clone(),
        baseline_version: baseline.version,
        baseline_reports: baseline.report_ids,
        results,
        verdict,
        warnings,
    })
}
