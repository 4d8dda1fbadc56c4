// Baseline selection from report history
//
// The history store is an external collaborator (may block on I/O, owns its
// own timeout policy). Selection itself is deterministic: most recent first,
// ties broken by report id, truncated to the configured count. A short
// history is not an error; the shortfall is reported as a warning.

use crate::error::{HistoryError, RunWarning};
use crate::regression::config::{ComparisonConfig, Scope};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scores from one prior report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub report_id: String,
    pub project: String,
    pub version: String,
    /// Report creation time (milliseconds since epoch)
    pub timestamp: u64,
    /// Benchmark identifier → score
    pub scores: BTreeMap<String, f64>,
}

/// Access to prior reports, queryable by project and version
pub trait HistoryStore {
    /// All reports for `project` at `version`, in any order
    fn reports(&self, project: &str, version: &str) -> Result<Vec<HistoryRecord>, HistoryError>;
}

/// History held in memory (e.g. loaded from a JSON export)
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    records: Vec<HistoryRecord>,
}

impl InMemoryHistory {
    pub fn new(records: Vec<HistoryRecord>) -> Self {
        Self { records }
    }

    /// Parse a JSON array of history records
    pub fn from_json(json: &str) -> Result<Self, HistoryError> {
        let records: Vec<HistoryRecord> =
            serde_json::from_str(json).map_err(|e| HistoryError::Malformed(e.to_string()))?;
        Ok(Self::new(records))
    }

    pub fn push(&mut self, record: HistoryRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl HistoryStore for InMemoryHistory {
    fn reports(&self, project: &str, version: &str) -> Result<Vec<HistoryRecord>, HistoryError> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.project == project && r.version == version)
            .cloned()
            .collect())
    }
}

/// Baseline chosen for a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSelection {
    /// Version the baseline was drawn from
    pub version: String,
    /// Number of reports requested by the configuration
    pub requested: usize,
    /// Report ids used, most recent first
    pub report_ids: Vec<String>,
    /// Benchmark identifier → baseline scores, most recent first
    pub scores: BTreeMap<String, Vec<f64>>,
}

impl BaselineSelection {
    pub fn available(&self) -> usize {
        self.report_ids.len()
    }

    pub fn is_reduced(&self) -> bool {
        self.available() < self.requested
    }

    /// Warning describing a reduced baseline, if any
    pub fn shortfall(&self) -> Option<RunWarning> {
        self.is_reduced().then(|| RunWarning::InsufficientBaseline {
            requested: self.requested,
            available: self.available(),
        })
    }
}

/// Select the baseline reports for a run
///
/// `exclude_report` keeps the current run out of its own baseline when the
/// store already contains it.
pub fn select_baseline(
    config: &ComparisonConfig,
    project: &str,
    current_version: &str,
    exclude_report: Option<&str>,
    store: &dyn HistoryStore,
) -> Result<BaselineSelection, HistoryError> {
    let version = match &config.scope {
        Scope::Within => current_version.to_string(),
        Scope::Between { compare_version } => compare_version.clone(),
    };

    let mut records: Vec<HistoryRecord> = store
        .reports(project, &version)?
        .into_iter()
        .filter(|r| Some(r.report_id.as_str()) != exclude_report)
        .collect();

    records.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.report_id.cmp(&b.report_id))
    });
    records.truncate(config.baseline_reports);

    let mut scores: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in &records {
        for (benchmark, score) in &record.scores {
            scores.entry(benchmark.clone()).or_default().push(*score);
        }
    }

    let selection = BaselineSelection {
        version,
        requested: config.baseline_reports,
        report_ids: records.into_iter().map(|r| r.report_id).collect(),
        scores,
    };

    if selection.is_reduced() {
        tracing::warn!(
            "Baseline reduced for {}@{}: {} of {} requested reports available",
            project,
            selection.version,
            selection.available(),
            selection.requested
        );
    } else {
        tracing::info!(
            "Selected {} baseline reports for {}@{}",
            selection.available(),
            project,
            selection.version
        );
    }

    Ok(selection)
}
