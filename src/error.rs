//! Error taxonomy for a benchmark run
//!
//! Fatal conditions are variants of [`BenchError`]; each maps to its own
//! process exit status so calling tooling can tell a regression failure
//! apart from an I/O or configuration problem.
//!
//! Recoverable conditions never abort the run. They are collected as
//! [`RunWarning`] values and written into the report.

use crate::regression::ConfigError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors surfaced to the caller of the engine
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Invalid comparison configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(
        "Too many anomalies: {count} benchmark(s) deviate from baseline (allowed {allowed}): {}",
        .offenders.join(", ")
    )]
    TooManyAnomalies {
        count: usize,
        allowed: usize,
        offenders: Vec<String>,
    },

    #[error("Benchmark score is less than expected: {actual} < {expected}")]
    ScoreBelowExpected { actual: f64, expected: f64 },

    #[error("History store error: {0}")]
    History(#[from] HistoryError),

    #[error("Failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    /// Process exit status for this failure kind
    pub fn exit_code(&self) -> i32 {
        match self {
            BenchError::TooManyAnomalies { .. } => 3,
            BenchError::ScoreBelowExpected { .. } => 4,
            BenchError::Config(_) => 2,
            BenchError::History(_) | BenchError::Parse { .. } | BenchError::Io(_) => 1,
        }
    }
}

/// Errors raised by a history store collaborator
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("History unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed history record: {0}")]
    Malformed(String),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, BenchError>;

/// Recoverable condition recorded in the report instead of aborting the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunWarning {
    /// Measurement excluded from aggregation
    MalformedMeasurement { benchmark: String, reason: String },

    /// Fingerprint inputs could not be resolved for one benchmark
    FingerprintUnresolved {
        benchmark: String,
        missing: Vec<String>,
    },

    /// Fewer baseline reports than requested were available
    InsufficientBaseline { requested: usize, available: usize },

    /// Comparison configuration was accepted after an adjustment
    ConfigAdjusted { field: String, message: String },

    /// Comparison configuration was rejected; comparison skipped
    ComparisonSkipped { reason: String },

    /// Run setting fell back to its default
    SettingDefaulted { field: String, message: String },
}

impl std::fmt::Display for RunWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunWarning::MalformedMeasurement { benchmark, reason } => {
                write!(f, "malformed measurement '{}': {}", benchmark, reason)
            }
            RunWarning::FingerprintUnresolved { benchmark, missing } => write!(
                f,
                "fingerprint unresolved for '{}' (missing: {})",
                benchmark,
                missing.join(", ")
            ),
            RunWarning::InsufficientBaseline {
                requested,
                available,
            } => write!(
                f,
                "insufficient baseline: {} of {} requested reports available",
                available, requested
            ),
            RunWarning::ConfigAdjusted { field, message } => {
                write!(f, "comparison config '{}': {}", field, message)
            }
            RunWarning::ComparisonSkipped { reason } => {
                write!(f, "comparison skipped: {}", reason)
            }
            RunWarning::SettingDefaulted { field, message } => {
                write!(f, "run setting '{}': {}", field, message)
            }
        }
    }
}
