// Statistical regression detection against historical baselines
//
// A run's current scores are compared with the scores of the most recent
// prior reports (same version for WITHIN, a named version for BETWEEN)
// using one of two methods:
// - SD: standard-deviation band around the baseline mean
// - DELTA / PERCENT_CHANGE: relative change against the baseline mean
//
// The anomaly gate then rejects the run if more benchmarks are anomalous
// than the configuration allows. Benchmarks without history are reported
// as unevaluated and never count toward the gate.

mod baseline;
mod comparator;
mod config;
mod gate;
mod statistics;
mod verdict;

pub use baseline::{select_baseline, BaselineSelection, HistoryRecord, HistoryStore, InMemoryHistory};
pub use comparator::{AnomalyResult, Evaluation, RegressionComparator, STABLE_EPSILON};
pub use config::{
    ComparisonConfig, ConfigError, Method, RawComparisonConfig, RawNumber, Scope, Threshold,
    ValidatedConfig,
};
pub use gate::{AnomalyGate, GateVerdict};
pub use statistics::{baseline_stats, BaselineStats};
pub use verdict::{assess_regression, ComparisonOutcome};
