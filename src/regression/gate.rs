// Anomaly gate: the single hard stop for a run
//
// Counts anomalous results and rejects the run when the count exceeds the
// allowance. The gate never exits the process; rejection is a value the
// caller turns into BenchError::TooManyAnomalies after persisting artifacts.

use crate::error::BenchError;
use crate::regression::comparator::AnomalyResult;
use serde::{Deserialize, Serialize};

/// Gate decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum GateVerdict {
    Pass {
        anomalies: usize,
        allowed: usize,
    },
    Fail {
        anomalies: usize,
        allowed: usize,
        /// Offending benchmark identifiers
        offenders: Vec<String>,
    },
}

impl GateVerdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, GateVerdict::Pass { .. })
    }

    pub fn anomalies(&self) -> usize {
        match self {
            GateVerdict::Pass { anomalies, .. } | GateVerdict::Fail { anomalies, .. } => *anomalies,
        }
    }

    /// Convert a failing verdict into the run's fatal error
    pub fn into_result(self) -> Result<(), BenchError> {
        match self {
            GateVerdict::Pass { .. } => Ok(()),
            GateVerdict::Fail {
                anomalies,
                allowed,
                offenders,
            } => Err(BenchError::TooManyAnomalies {
                count: anomalies,
                allowed,
                offenders,
            }),
        }
    }
}

/// Counts anomalies against an allowance
#[derive(Debug, Clone, Copy)]
pub struct AnomalyGate {
    allowed: usize,
}

impl AnomalyGate {
    pub fn new(allowed: usize) -> Self {
        Self { allowed }
    }

    /// Pass unless more than `allowed` results are anomalous
    ///
    /// # Example
    /// ```
    /// use benchgate::regression::AnomalyGate;
    ///
    /// let verdict = AnomalyGate::new(2).gate(&[]);
    /// assert!(verdict.is_pass());
    /// ```
    pub fn gate(&self, results: &[AnomalyResult]) -> GateVerdict {
        let offenders: Vec<String> = results
            .iter()
            .filter(|r| r.is_anomalous())
            .map(|r| r.benchmark.clone())
            .collect();
        let anomalies = offenders.len();

        if anomalies > self.allowed {
            tracing::error!(
                "Too many anomalies: {} > {} allowed ({})",
                anomalies,
                self.allowed,
                offenders.join(", ")
            );
            GateVerdict::Fail {
                anomalies,
                allowed: self.allowed,
                offenders,
            }
        } else {
            tracing::info!("Anomaly gate passed: {} of {} allowed", anomalies, self.allowed);
            GateVerdict::Pass {
                anomalies,
                allowed: self.allowed,
            }
        }
    }
}
