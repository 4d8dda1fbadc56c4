//! Run settings and the TOML run file
//!
//! ```toml
//! [run]
//! project = "serializer"
//! project_version = "2.4.0"
//! forks = 2
//! expected_score = 1500.0
//! upload_status = "private"
//! user_properties = "team=io;owner=alice"
//! custom_benchmark_metadata = "com.acme.IoBench:api=io"
//!
//! [comparison]
//! scope = "WITHIN"
//! method = "SD"
//! baseline_reports = 5
//! allowed_deviations = 2.0
//! allowed_anomalies = 1
//! ```
//!
//! Every `[run]` field has a default. The `[comparison]` table is optional;
//! its fields stay raw until validated.

use crate::error::{BenchError, Result, RunWarning};
use crate::regression::RawComparisonConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_REPORT_NAME: &str = "Benchmark Report";

/// Score threshold value meaning "no expected score"
pub const EXPECTED_SCORE_DISABLED: f64 = -1.0;

/// Typed run parameters, recorded in the report as `benchmark_settings`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub project: String,
    pub project_version: String,
    pub report_name: String,
    pub forks: u32,
    pub threads: u32,
    pub measurement_iterations: u32,
    /// Seconds per measurement iteration
    pub measurement_seconds: u32,
    pub warmup_iterations: u32,
    /// Seconds per warm-up iteration
    pub warmup_seconds: u32,
    /// Minimum overall score; disabled when <= 0
    pub expected_score: f64,
    /// "public" or "private"
    pub upload_status: String,
    /// `key=value;key2=value2`
    pub user_properties: String,
    /// `target:key=value,...;target2:...`
    pub custom_benchmark_metadata: String,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            project: String::new(),
            project_version: String::new(),
            report_name: DEFAULT_REPORT_NAME.to_string(),
            forks: 1,
            threads: 1,
            measurement_iterations: 5,
            measurement_seconds: 10,
            warmup_iterations: 3,
            warmup_seconds: 5,
            expected_score: EXPECTED_SCORE_DISABLED,
            upload_status: UploadStatus::Public.as_str().to_string(),
            user_properties: String::new(),
            custom_benchmark_metadata: String::new(),
        }
    }
}

impl RunSettings {
    /// Replace unusable values with defaults, one warning per field
    pub fn normalize(&mut self) -> Vec<RunWarning> {
        let defaults = Self::default();
        let mut warnings = Vec::new();

        let mut reset = |field: &str, value: &mut u32, default: u32| {
            if *value == 0 {
                warnings.push(RunWarning::SettingDefaulted {
                    field: field.to_string(),
                    message: format!("must be at least 1, using {}", default),
                });
                *value = default;
            }
        };
        reset("forks", &mut self.forks, defaults.forks);
        reset("threads", &mut self.threads, defaults.threads);
        reset(
            "measurement_iterations",
            &mut self.measurement_iterations,
            defaults.measurement_iterations,
        );
        reset(
            "measurement_seconds",
            &mut self.measurement_seconds,
            defaults.measurement_seconds,
        );

        if !self.expected_score.is_finite() {
            warnings.push(RunWarning::SettingDefaulted {
                field: "expected_score".to_string(),
                message: format!("{} is not a number, expected score disabled", self.expected_score),
            });
            self.expected_score = EXPECTED_SCORE_DISABLED;
        }

        if self.report_name.trim().is_empty() {
            warnings.push(RunWarning::SettingDefaulted {
                field: "report_name".to_string(),
                message: format!("empty, using '{}'", DEFAULT_REPORT_NAME),
            });
            self.report_name = DEFAULT_REPORT_NAME.to_string();
        }

        for warning in &warnings {
            tracing::warn!("{}", warning);
        }
        warnings
    }

    /// Expected score, if the check is enabled
    pub fn expected_score(&self) -> Option<f64> {
        (self.expected_score > 0.0).then_some(self.expected_score)
    }
}

/// Report visibility requested for external storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Public,
    Private,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Public => "public",
            UploadStatus::Private => "private",
        }
    }

    /// Parse a configured status; unknown values fall back to public
    pub fn resolve(raw: &str) -> (Self, Option<RunWarning>) {
        match raw.trim().to_ascii_lowercase().as_str() {
            "public" => (UploadStatus::Public, None),
            "private" => (UploadStatus::Private, None),
            other => {
                tracing::warn!("Unknown upload status '{}', using public", other);
                (
                    UploadStatus::Public,
                    Some(RunWarning::SettingDefaulted {
                        field: "upload_status".to_string(),
                        message: format!("unknown value '{}', using public", raw),
                    }),
                )
            }
        }
    }
}

/// Contents of a TOML run file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunFile {
    #[serde(default)]
    pub run: RunSettings,
    #[serde(default)]
    pub comparison: Option<RawComparisonConfig>,
}

impl RunFile {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| BenchError::Parse {
            what: "run file".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}
