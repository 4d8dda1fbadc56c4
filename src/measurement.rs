//! Raw benchmark measurements handed over by the execution harness
//!
//! A [`Measurement`] is immutable once recorded. Validation happens before
//! aggregation so that a single broken result is excluded instead of
//! poisoning the category and overall scores.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category assigned to benchmarks that declare none
pub const DEFAULT_CATEGORY: &str = "CUSTOM";

/// One executed benchmark's raw result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Qualified benchmark name (e.g., "com.acme.io.FileBench.readSmall")
    pub identifier: String,
    /// Category declared by the harness, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Primary score (higher is better)
    pub score: f64,
    /// Score unit (e.g., "ops/s")
    #[serde(default)]
    pub unit: String,
    /// Score error / uncertainty reported by the harness
    #[serde(default)]
    pub error: f64,
    /// Number of raw samples behind the score
    #[serde(default)]
    pub sample_count: u64,
}

/// Reason a measurement was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedMeasurement {
    #[error("benchmark identifier is empty")]
    EmptyIdentifier,

    #[error("score is not finite ({0})")]
    NonFiniteScore(f64),

    #[error("score is negative ({0})")]
    NegativeScore(f64),

    #[error("duplicate benchmark identifier")]
    Duplicate,
}

impl Measurement {
    /// Create a measurement with default unit/error/sample count
    pub fn new(identifier: impl Into<String>, score: f64) -> Self {
        Self {
            identifier: identifier.into(),
            category: None,
            score,
            unit: "ops/s".to_string(),
            error: 0.0,
            sample_count: 0,
        }
    }

    /// Set the declared category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Category this measurement aggregates under
    pub fn category(&self) -> &str {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
    }

    /// Check the score is usable for aggregation
    pub fn validate(&self) -> Result<(), MalformedMeasurement> {
        if self.identifier.trim().is_empty() {
            return Err(MalformedMeasurement::EmptyIdentifier);
        }
        if !self.score.is_finite() {
            return Err(MalformedMeasurement::NonFiniteScore(self.score));
        }
        if self.score < 0.0 {
            return Err(MalformedMeasurement::NegativeScore(self.score));
        }
        Ok(())
    }
}

/// Class/method split of a qualified benchmark name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkName<'a> {
    pub class: &'a str,
    pub method: &'a str,
}

impl<'a> BenchmarkName<'a> {
    /// Split at the last '.'; a name without a dot is its own class
    pub fn parse(identifier: &'a str) -> Self {
        match identifier.rsplit_once('.') {
            Some((class, method)) if !class.is_empty() => Self { class, method },
            _ => Self {
                class: identifier,
                method: "",
            },
        }
    }
}
