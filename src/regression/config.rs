// Comparison configuration and its validation
//
// Raw fields arrive from the configuration loader as loosely typed
// strings/numbers. They are validated exactly once into a typed
// ComparisonConfig. Every rule failure is a named ConfigError: falling back
// to a default would silently disable regression protection.

use crate::error::RunWarning;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation failures, one per rule
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("scope is required (WITHIN or BETWEEN)")]
    MissingScope,

    #[error("scope must be WITHIN or BETWEEN, got '{0}'")]
    InvalidScope(String),

    #[error("scope BETWEEN requires a non-empty compare_version")]
    MissingCompareVersion,

    #[error("baseline_reports must be an integer >= 1, got {0}")]
    InvalidBaselineCount(String),

    #[error("allowed_anomalies must be an integer >= 1, got {0}")]
    InvalidAnomalyCount(String),

    #[error("method is required (SD or DELTA)")]
    MissingMethod,

    #[error("method must be SD or DELTA, got '{0}'")]
    InvalidMethod(String),

    #[error("method SD requires allowed_deviations > 0, got {0}")]
    InvalidDeviations(String),

    #[error("method DELTA requires a threshold (PERCENT_CHANGE)")]
    MissingThreshold,

    #[error("threshold must be PERCENT_CHANGE, got '{0}'")]
    InvalidThreshold(String),

    #[error("threshold PERCENT_CHANGE requires allowed_percent_change > 0, got {0}")]
    InvalidPercentChange(String),
}

/// Numeric field as delivered by a loader: integer, float or text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[serde(untagged)]
pub enum RawNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawNumber {
    fn describe(&self) -> String {
        match self {
            RawNumber::Int(v) => v.to_string(),
            RawNumber::Float(v) => v.to_string(),
            RawNumber::Text(v) => format!("'{}'", v),
        }
    }

    /// Positive integer (>= 1)
    fn as_count(&self) -> Option<usize> {
        let value = match self {
            RawNumber::Int(v) => *v,
            RawNumber::Float(_) => return None,
            RawNumber::Text(v) => v.trim().parse::<i64>().ok()?,
        };
        usize::try_from(value).ok().filter(|v| *v >= 1)
    }

    /// Positive finite real (> 0)
    fn as_positive_real(&self) -> Option<f64> {
        let value = match self {
            RawNumber::Int(v) => *v as f64,
            RawNumber::Float(v) => *v,
            RawNumber::Text(v) => v.trim().parse::<f64>().ok()?,
        };
        Some(value).filter(|v| v.is_finite() && *v > 0.0)
    }
}

impl From<i64> for RawNumber {
    fn from(value: i64) -> Self {
        RawNumber::Int(value)
    }
}

impl From<f64> for RawNumber {
    fn from(value: f64) -> Self {
        RawNumber::Float(value)
    }
}

impl From<&str> for RawNumber {
    fn from(value: &str) -> Self {
        RawNumber::Text(value.to_string())
    }
}

/// Unvalidated comparison fields, as read from a `[comparison]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[serde(default)]
pub struct RawComparisonConfig {
    pub scope: Option<String>,
    pub compare_version: Option<String>,
    pub method: Option<String>,
    pub threshold: Option<String>,
    pub baseline_reports: Option<RawNumber>,
    pub allowed_deviations: Option<RawNumber>,
    pub allowed_percent_change: Option<RawNumber>,
    pub allowed_anomalies: Option<RawNumber>,
}

/// Which reports form the baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scope {
    /// Same project version as the current run
    Within,
    /// A named other project version
    Between { compare_version: String },
}

/// Delta threshold kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "threshold", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Threshold {
    PercentChange { allowed_percent_change: f64 },
}

/// Statistical comparison method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Method {
    /// Standard-deviation band around the baseline mean
    #[serde(rename = "SD")]
    StdDev { allowed_deviations: f64 },
    /// Relative change against the baseline mean
    Delta { threshold: Threshold },
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::StdDev { .. } => "SD",
            Method::Delta { .. } => "DELTA",
        }
    }
}

/// Validated comparison configuration
///
/// # Example
/// ```
/// use benchgate::regression::{RawComparisonConfig, Scope};
///
/// let raw = RawComparisonConfig {
///     scope: Some("WITHIN".to_string()),
///     method: Some("SD".to_string()),
///     baseline_reports: Some(5i64.into()),
///     allowed_deviations: Some(2.0f64.into()),
///     allowed_anomalies: Some(1i64.into()),
///     ..Default::default()
/// };
/// let validated = raw.validate().unwrap();
/// assert_eq!(validated.config.scope, Scope::Within);
/// assert_eq!(validated.config.baseline_reports, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonConfig {
    pub scope: Scope,
    pub method: Method,
    pub baseline_reports: usize,
    pub allowed_anomalies: usize,
}

/// Validation result: the config plus any non-fatal adjustments
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    pub config: ComparisonConfig,
    pub warnings: Vec<RunWarning>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl RawComparisonConfig {
    /// Validate all rules, stopping at the first violation
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        let mut warnings = Vec::new();

        // Rule 1: scope
        let scope = match non_empty(&self.scope).map(str::to_ascii_uppercase) {
            None => return Err(ConfigError::MissingScope),
            Some(s) if s == "WITHIN" => {
                if let Some(version) = non_empty(&self.compare_version) {
                    tracing::warn!(
                        "Scope WITHIN ignores compare_version '{}'; comparing within the current version",
                        version
                    );
                    warnings.push(RunWarning::ConfigAdjusted {
                        field: "compare_version".to_string(),
                        message: format!("ignored '{}' because scope is WITHIN", version),
                    });
                }
                Scope::Within
            }
            Some(s) if s == "BETWEEN" => match non_empty(&self.compare_version) {
                Some(version) => Scope::Between {
                    compare_version: version.to_string(),
                },
                None => return Err(ConfigError::MissingCompareVersion),
            },
            Some(_) => {
                return Err(ConfigError::InvalidScope(
                    self.scope.clone().unwrap_or_default(),
                ))
            }
        };

        // Rule 2: baseline report count
        let baseline_reports = count_field(&self.baseline_reports)
            .map_err(ConfigError::InvalidBaselineCount)?;

        // Rule 3: anomaly allowance
        let allowed_anomalies = count_field(&self.allowed_anomalies)
            .map_err(ConfigError::InvalidAnomalyCount)?;

        // Rules 4-6: method and its parameters
        let method = match non_empty(&self.method).map(str::to_ascii_uppercase) {
            None => return Err(ConfigError::MissingMethod),
            Some(m) if m == "SD" => Method::StdDev {
                allowed_deviations: real_field(&self.allowed_deviations)
                    .map_err(ConfigError::InvalidDeviations)?,
            },
            Some(m) if m == "DELTA" => Method::Delta {
                threshold: self.threshold()?,
            },
            Some(_) => {
                return Err(ConfigError::InvalidMethod(
                    self.method.clone().unwrap_or_default(),
                ))
            }
        };

        Ok(ValidatedConfig {
            config: ComparisonConfig {
                scope,
                method,
                baseline_reports,
                allowed_anomalies,
            },
            warnings,
        })
    }

    fn threshold(&self) -> Result<Threshold, ConfigError> {
        match non_empty(&self.threshold).map(str::to_ascii_uppercase) {
            None => Err(ConfigError::MissingThreshold),
            Some(t) if t == "PERCENT_CHANGE" => Ok(Threshold::PercentChange {
                allowed_percent_change: real_field(&self.allowed_percent_change)
                    .map_err(ConfigError::InvalidPercentChange)?,
            }),
            Some(_) => Err(ConfigError::InvalidThreshold(
                self.threshold.clone().unwrap_or_default(),
            )),
        }
    }
}

fn count_field(value: &Option<RawNumber>) -> Result<usize, String> {
    match value {
        None => Err("nothing".to_string()),
        Some(raw) => raw.as_count().ok_or_else(|| raw.describe()),
    }
}

fn real_field(value: &Option<RawNumber>) -> Result<f64, String> {
    match value {
        None => Err("nothing".to_string()),
        Some(raw) => raw.as_positive_real().ok_or_else(|| raw.describe()),
    }
}
