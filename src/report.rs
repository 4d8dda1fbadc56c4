//! Report assembly
//!
//! [`ReportAssembler`] folds measurements, fingerprints and declared metadata
//! into one [`BenchmarkOverviewReport`]. The assembled report is owned by the
//! run that built it; the engine attaches the comparison outcome and the
//! report is never touched again once handed to the caller.

use crate::error::RunWarning;
use crate::fingerprint::{BenchmarkSource, Fingerprint, FingerprintGenerator, FingerprintRecord};
use crate::measurement::{Measurement, DEFAULT_CATEGORY};
use crate::metadata::{self, keys, Annotations, MetadataMap};
use crate::regression::ComparisonOutcome;
use crate::scoring::{ScoreAggregator, ScoreSummary};
use crate::settings::{RunSettings, UploadStatus};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Length of the hex session identifier
pub const SESSION_ID_LEN: usize = 32;

/// One benchmark's report entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub identifier: String,
    pub category: String,
    pub score: f64,
    pub unit: String,
    pub error: f64,
    pub sample_count: u64,
    pub fingerprint: Fingerprint,
    #[serde(default)]
    pub metadata: MetadataMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub project: String,
    pub project_version: String,
}

impl BenchmarkReport {
    fn new(measurement: &Measurement, category: &str, fingerprint: Fingerprint) -> Self {
        Self {
            identifier: measurement.identifier.clone(),
            category: category.to_string(),
            score: measurement.score,
            unit: measurement.unit.clone(),
            error: measurement.error,
            sample_count: measurement.sample_count,
            fingerprint,
            metadata: MetadataMap::new(),
            context: None,
            version: None,
            project: String::new(),
            project_version: String::new(),
        }
    }

    /// Record metadata, copying legacy keys into their typed fields
    pub fn apply_metadata(&mut self, values: &MetadataMap) {
        for (key, value) in values {
            match key.as_str() {
                keys::CATEGORY => {
                    let category = value.trim();
                    self.category = if category.is_empty() {
                        DEFAULT_CATEGORY.to_string()
                    } else {
                        category.to_string()
                    };
                }
                keys::CONTEXT => self.context = Some(value.clone()),
                keys::VERSION => self.version = Some(value.clone()),
                keys::PROJECT => self.project = value.clone(),
                keys::PROJECT_VERSION => self.project_version = value.clone(),
                _ => {}
            }
            self.metadata.insert(key.clone(), value.clone());
        }
    }
}

/// Aggregate report for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkOverviewReport {
    pub report_name: String,
    pub session_id: String,
    pub project: String,
    pub project_version: String,
    /// Run start (milliseconds since epoch)
    pub timestamp: u64,
    /// Category → entries, sorted by category then identifier
    pub benchmarks: BTreeMap<String, Vec<BenchmarkReport>>,
    pub total_score: f64,
    pub category_scores: BTreeMap<String, f64>,
    pub environment_settings: BTreeMap<String, serde_json::Value>,
    pub benchmark_settings: RunSettings,
    pub upload_status: UploadStatus,
    pub eligible_for_storing_externally: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonOutcome>,
    #[serde(default)]
    pub warnings: Vec<RunWarning>,
}

impl BenchmarkOverviewReport {
    pub fn benchmark_count(&self) -> usize {
        self.benchmarks.values().map(Vec::len).sum()
    }

    pub fn find(&self, identifier: &str) -> Option<&BenchmarkReport> {
        self.benchmarks
            .values()
            .flatten()
            .find(|b| b.identifier == identifier)
    }

    /// Benchmark identifier → score, as fed to the comparator
    pub fn scores(&self) -> BTreeMap<String, f64> {
        self.benchmarks
            .values()
            .flatten()
            .map(|b| (b.identifier.clone(), b.score))
            .collect()
    }
}

/// Session identifier, stable for the same project, version, report name
/// and start time
///
/// # Example
/// ```
/// use benchgate::report::session_id;
///
/// let a = session_id("serializer", "2.4.0", "Benchmark Report", 1_700_000_000_000);
/// let b = session_id("serializer", "2.4.0", "Benchmark Report", 1_700_000_000_000);
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 32);
/// ```
pub fn session_id(project: &str, version: &str, report_name: &str, started_at: u64) -> String {
    let mut hasher = Sha256::new();
    for part in [project, version, report_name] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(started_at.to_be_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(SESSION_ID_LEN);
    id
}

/// Builds the report from harness output
#[derive(Debug, Clone, Default)]
pub struct ReportAssembler {
    aggregator: ScoreAggregator,
    generator: FingerprintGenerator,
}

impl ReportAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score, fingerprint and annotate one run's measurements
    ///
    /// Declared `api` categories are applied before aggregation so category
    /// scores and report grouping agree. Recoverable problems are returned
    /// in `report.warnings`.
    pub fn assemble(
        &self,
        measurements: &[Measurement],
        sources: &[BenchmarkSource],
        annotations: &Annotations,
        settings: &RunSettings,
        started_at: u64,
    ) -> BenchmarkOverviewReport {
        let mut warnings = Vec::new();

        let mut annotations = annotations.clone();
        let identifiers: BTreeSet<String> =
            measurements.iter().map(|m| m.identifier.clone()).collect();
        annotations.merge_custom(
            metadata::parse_benchmark_metadata(&settings.custom_benchmark_metadata),
            &identifiers,
        );

        let filed: Vec<Measurement> = measurements
            .iter()
            .map(|m| match annotations.declared_category(&m.identifier) {
                Some(category) => m.clone().with_category(category),
                None => m.clone(),
            })
            .collect();

        // Step 1: Score
        let summary = self.aggregator.aggregate(&filed);
        for rejected in &summary.rejected {
            warnings.push(RunWarning::MalformedMeasurement {
                benchmark: rejected.identifier.clone(),
                reason: rejected.reason.to_string(),
            });
        }

        // Step 2: Fingerprint the benchmarks that survived validation
        let fingerprints = self.fingerprint(&summary, sources);
        for record in fingerprints.values().filter(|r| !r.is_resolved()) {
            warnings.push(RunWarning::FingerprintUnresolved {
                benchmark: record.identifier.clone(),
                missing: record.missing.clone(),
            });
        }

        // Step 3: Build entries
        let (project, project_version) = lift_project(&summary, &annotations, settings);
        let benchmarks = self.entries(
            &summary,
            &fingerprints,
            &annotations,
            &project,
            &project_version,
        );

        let (upload_status, status_warning) = UploadStatus::resolve(&settings.upload_status);
        warnings.extend(status_warning);

        let eligible = !summary.per_benchmark.is_empty()
            && summary.rejected.is_empty()
            && fingerprints.values().all(FingerprintRecord::is_resolved);

        let mut environment_settings = BTreeMap::new();
        environment_settings.insert(
            "userDefinedProperties".to_string(),
            serde_json::json!(metadata::parse_user_properties(&settings.user_properties)),
        );
        environment_settings.insert(
            "engineVersion".to_string(),
            serde_json::json!(env!("CARGO_PKG_VERSION")),
        );

        tracing::info!(
            "Assembled report '{}': {} benchmarks, total score {:.4}, eligible={}",
            settings.report_name,
            summary.per_benchmark.len(),
            summary.overall,
            eligible
        );

        BenchmarkOverviewReport {
            report_name: settings.report_name.clone(),
            session_id: session_id(&project, &project_version, &settings.report_name, started_at),
            project,
            project_version,
            timestamp: started_at,
            benchmarks,
            total_score: summary.overall,
            category_scores: summary.per_category.clone(),
            environment_settings,
            benchmark_settings: settings.clone(),
            upload_status,
            eligible_for_storing_externally: eligible,
            comparison: None,
            warnings,
        }
    }

    fn fingerprint(
        &self,
        summary: &ScoreSummary,
        sources: &[BenchmarkSource],
    ) -> BTreeMap<String, FingerprintRecord> {
        let mut by_id: HashMap<&str, &BenchmarkSource> = HashMap::new();
        for source in sources {
            by_id.entry(source.identifier.as_str()).or_insert(source);
        }

        let wanted: Vec<BenchmarkSource> = summary
            .per_benchmark
            .keys()
            .map(|id| match by_id.get(id.as_str()) {
                Some(source) => (*source).clone(),
                None => BenchmarkSource::new(id.clone()),
            })
            .collect();

        self.generator
            .fingerprint_all(&wanted)
            .into_iter()
            .map(|record| (record.identifier.clone(), record))
            .collect()
    }

    fn entries(
        &self,
        summary: &ScoreSummary,
        fingerprints: &BTreeMap<String, FingerprintRecord>,
        annotations: &Annotations,
        project: &str,
        project_version: &str,
    ) -> BTreeMap<String, Vec<BenchmarkReport>> {
        let mut benchmarks: BTreeMap<String, Vec<BenchmarkReport>> = BTreeMap::new();

        for measurement in &summary.accepted {
            let fingerprint = fingerprints
                .get(&measurement.identifier)
                .map(|r| r.fingerprint.clone())
                .unwrap_or_default();
            let mut entry = BenchmarkReport::new(measurement, measurement.category(), fingerprint);
            entry.apply_metadata(&annotations.resolve(&measurement.identifier));
            if entry.project.is_empty() {
                entry.project = project.to_string();
            }
            if entry.project_version.is_empty() {
                entry.project_version = project_version.to_string();
            }

            benchmarks
                .entry(entry.category.clone())
                .or_default()
                .push(entry);
        }

        for entries in benchmarks.values_mut() {
            entries.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        }
        benchmarks
    }
}

/// Report-level project and version
///
/// An annotated `project` / `projectVersion` on any accepted benchmark
/// overrides the run settings; the first identifier in sorted order wins.
fn lift_project(
    summary: &ScoreSummary,
    annotations: &Annotations,
    settings: &RunSettings,
) -> (String, String) {
    let annotated = |key: &str| {
        summary
            .per_benchmark
            .keys()
            .filter_map(|id| annotations.resolve(id).get(key).cloned())
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    };

    let project = annotated(keys::PROJECT).unwrap_or_else(|| settings.project.clone());
    let version =
        annotated(keys::PROJECT_VERSION).unwrap_or_else(|| settings.project_version.clone());
    if project != settings.project || version != settings.project_version {
        tracing::debug!(
            "Annotated project {} {} overrides run settings {} {}",
            project,
            version,
            settings.project,
            settings.project_version
        );
    }
    (project, version)
}
