//! Run orchestration
//!
//! One run flows through:
//! 1. settings normalization and comparison-config validation
//! 2. report assembly (scoring, fingerprinting, metadata)
//! 3. regression assessment against history, when configured
//!
//! [`Engine::run`] always hands back the finished report when one could be
//! built. Fatal verdicts (too many anomalies, score below expected, invalid
//! comparison config) are surfaced afterwards by [`RunOutcome::into_result`],
//! so the caller can persist the report first.

use crate::error::{BenchError, HistoryError, Result, RunWarning};
use crate::fingerprint::BenchmarkSource;
use crate::measurement::Measurement;
use crate::metadata::Annotations;
use crate::regression::{assess_regression, HistoryRecord, HistoryStore, RawComparisonConfig};
use crate::report::{BenchmarkOverviewReport, ReportAssembler};
use crate::settings::RunSettings;
use serde::{Deserialize, Serialize};

/// Everything one run needs
#[derive(Debug, Clone, Default)]
pub struct RunInput {
    pub measurements: Vec<Measurement>,
    pub sources: Vec<BenchmarkSource>,
    pub annotations: Annotations,
    pub settings: RunSettings,
    /// Raw `[comparison]` fields; `None` disables regression checks
    pub comparison: Option<RawComparisonConfig>,
    /// Run start (milliseconds since epoch)
    pub started_at: u64,
}

/// Per-benchmark source text as exported by the harness
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceText {
    pub identifier: String,
    #[serde(default)]
    pub declared: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub container: Option<String>,
}

impl From<SourceText> for BenchmarkSource {
    fn from(text: SourceText) -> Self {
        BenchmarkSource {
            identifier: text.identifier,
            declared: text.declared.map(String::into_bytes),
            body: text.body.map(String::into_bytes),
            container: text.container.map(String::into_bytes),
        }
    }
}

/// Harness export: measurements plus optional sources and annotations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarnessOutput {
    pub measurements: Vec<Measurement>,
    #[serde(default)]
    pub sources: Vec<SourceText>,
    #[serde(default)]
    pub annotations: Annotations,
}

impl HarnessOutput {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| BenchError::Parse {
            what: "measurements".to_string(),
            reason: e.to_string(),
        })
    }
}

/// Result of a run that produced a report
#[derive(Debug)]
pub struct RunOutcome {
    pub report: BenchmarkOverviewReport,
    /// Why regression comparison was skipped, if it was
    pub comparison_error: Option<BenchError>,
}

impl RunOutcome {
    /// Turn the run's verdicts into the caller's result
    ///
    /// Checked in order: anomaly gate, expected score, comparison error.
    pub fn into_result(self) -> Result<BenchmarkOverviewReport> {
        if let Some(comparison) = &self.report.comparison {
            comparison.verdict.clone().into_result()?;
        }

        if let Some(expected) = self.report.benchmark_settings.expected_score() {
            if self.report.total_score < expected {
                return Err(BenchError::ScoreBelowExpected {
                    actual: self.report.total_score,
                    expected,
                });
            }
        }

        match self.comparison_error {
            Some(error) => Err(error),
            None => Ok(self.report),
        }
    }

    /// Generate human-readable summary
    pub fn to_report_string(&self) -> String {
        let report = &self.report;
        let mut out = String::new();

        out.push_str(&format!(
            "=== {} (session {}) ===\n",
            report.report_name, report.session_id
        ));
        out.push_str(&format!(
            "Total score: {:.4} ({} benchmarks)\n",
            report.total_score,
            report.benchmark_count()
        ));
        for (category, score) in &report.category_scores {
            out.push_str(&format!("  {:<20} {:.4}\n", category, score));
        }
        if let Some(expected) = report.benchmark_settings.expected_score() {
            let marker = if report.total_score >= expected { "✅" } else { "❌" };
            out.push_str(&format!("{} Expected score: {:.4}\n", marker, expected));
        }
        out.push_str(&format!(
            "Upload: {}, eligible for external storage: {}\n",
            report.upload_status.as_str(),
            report.eligible_for_storing_externally
        ));

        if !report.warnings.is_empty() {
            out.push_str("\n⚠️  Warnings:\n");
            for warning in &report.warnings {
                out.push_str(&format!("  - {}\n", warning));
            }
        }

        match (&report.comparison, &self.comparison_error) {
            (Some(comparison), _) => {
                out.push('\n');
                out.push_str(&comparison.to_report_string());
            }
            (None, Some(error)) => out.push_str(&format!("\n❌ {}\n", error)),
            (None, None) => {}
        }

        out
    }
}

/// Runs the pipeline with a fixed assembler
#[derive(Debug, Clone, Default)]
pub struct Engine {
    assembler: ReportAssembler,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute one run against a history store
    pub fn run(&self, input: RunInput, store: &dyn HistoryStore) -> RunOutcome {
        let RunInput {
            measurements,
            sources,
            annotations,
            mut settings,
            comparison,
            started_at,
        } = input;

        let mut warnings = settings.normalize();

        // Step 1: Validate comparison config before anything is compared
        let mut comparison_error = None;
        let config = match comparison.map(|raw| raw.validate()) {
            Some(Ok(validated)) => {
                warnings.extend(validated.warnings);
                Some(validated.config)
            }
            Some(Err(e)) => {
                tracing::error!("Comparison config rejected: {}", e);
                warnings.push(RunWarning::ComparisonSkipped {
                    reason: e.to_string(),
                });
                comparison_error = Some(BenchError::Config(e));
                None
            }
            None => {
                tracing::debug!("No comparison config; regression checks disabled");
                None
            }
        };

        // Step 2: Assemble report
        let mut report = self.assembler.assemble(
            &measurements,
            &sources,
            &annotations,
            &settings,
            started_at,
        );
        warnings.append(&mut report.warnings);

        // Step 3: Compare against history
        if let Some(config) = config {
            match assess_regression(
                &config,
                &report.scores(),
                &report.project,
                &report.project_version,
                Some(&report.session_id),
                store,
            ) {
                Ok(outcome) => {
                    warnings.extend(outcome.warnings.iter().cloned());
                    report.comparison = Some(outcome);
                }
                Err(e) => {
                    tracing::error!("Baseline unavailable: {}", e);
                    warnings.push(RunWarning::ComparisonSkipped {
                        reason: e.to_string(),
                    });
                    comparison_error = Some(BenchError::History(e));
                }
            }
        }

        report.warnings = warnings;
        tracing::info!(
            "Run '{}' finished with {} warnings",
            report.report_name,
            report.warnings.len()
        );

        RunOutcome {
            report,
            comparison_error,
        }
    }
}

/// History store for runs without any prior reports
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

impl HistoryStore for NoHistory {
    fn reports(
        &self,
        _project: &str,
        _version: &str,
    ) -> std::result::Result<Vec<HistoryRecord>, HistoryError> {
        Ok(Vec::new())
    }
}
