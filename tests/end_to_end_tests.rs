//! End-to-end engine runs
//!
//! Goal: a full run (scoring, fingerprinting, metadata, comparison, gate)
//! produces a complete report and only fails where a verdict says so.

use benchgate::engine::{Engine, RunInput};
use benchgate::error::{BenchError, RunWarning};
use benchgate::fingerprint::BenchmarkSource;
use benchgate::measurement::Measurement;
use benchgate::metadata::Annotations;
use benchgate::regression::{Evaluation, HistoryRecord, InMemoryHistory, RawComparisonConfig};
use benchgate::settings::RunSettings;
use std::collections::BTreeMap;

const JSON_BENCHES: [&str; 5] = [
    "com.acme.json.Encode.small",
    "com.acme.json.Encode.large",
    "com.acme.json.Decode.small",
    "com.acme.json.Decode.large",
    "com.acme.json.Decode.nested",
];

const IO_BENCHES: [&str; 5] = [
    "com.acme.io.File.readSmall",
    "com.acme.io.File.readLarge",
    "com.acme.io.File.writeSmall",
    "com.acme.io.File.writeLarge",
    "com.acme.io.File.append",
];

fn measurements() -> Vec<Measurement> {
    let mut all = Vec::new();
    for (i, id) in JSON_BENCHES.iter().enumerate() {
        all.push(Measurement::new(*id, 1000.0 + i as f64 * 10.0).with_category("json"));
    }
    for (i, id) in IO_BENCHES.iter().enumerate() {
        all.push(Measurement::new(*id, 50.0 + i as f64).with_category("io"));
    }
    // writeLarge crashed mid-iteration
    all[8].score = f64::NAN;
    all
}

fn sources() -> Vec<BenchmarkSource> {
    JSON_BENCHES
        .iter()
        .chain(IO_BENCHES.iter())
        .map(|id| {
            BenchmarkSource::new(*id)
                .with_declared(format!("name={}", id))
                .with_body(format!("aload_0\ninvokevirtual {}\nreturn", id))
                .with_container("class surface")
        })
        .collect()
}

fn history() -> InMemoryHistory {
    let scores: BTreeMap<String, f64> = measurements()
        .into_iter()
        .filter(|m| m.score.is_finite())
        .map(|m| (m.identifier, m.score))
        .collect();

    InMemoryHistory::new(vec![
        HistoryRecord {
            report_id: "prev-1".to_string(),
            project: "acme".to_string(),
            version: "3.1.0".to_string(),
            timestamp: 1_000,
            scores: scores.clone(),
        },
        HistoryRecord {
            report_id: "prev-2".to_string(),
            project: "acme".to_string(),
            version: "3.1.0".to_string(),
            timestamp: 2_000,
            scores: scores.iter().map(|(k, v)| (k.clone(), v * 1.01)).collect(),
        },
        HistoryRecord {
            report_id: "other-version".to_string(),
            project: "acme".to_string(),
            version: "3.0.0".to_string(),
            timestamp: 3_000,
            scores,
        },
    ])
}

fn run_input() -> RunInput {
    RunInput {
        measurements: measurements(),
        sources: sources(),
        annotations: Annotations::default(),
        settings: RunSettings {
            project: "acme".to_string(),
            project_version: "3.1.0".to_string(),
            ..Default::default()
        },
        comparison: Some(RawComparisonConfig {
            scope: Some("WITHIN".to_string()),
            method: Some("SD".to_string()),
            baseline_reports: Some(5i64.into()),
            allowed_deviations: Some(3.0f64.into()),
            allowed_anomalies: Some(1i64.into()),
            ..Default::default()
        }),
        started_at: 5_000,
    }
}

#[test]
fn test_full_run_with_reduced_baseline() {
    let outcome = Engine::new().run(run_input(), &history());
    let report = &outcome.report;

    // Malformed measurement excluded, the other nine reported
    assert_eq!(report.benchmark_count(), 9);
    assert!(report.find("com.acme.io.File.writeLarge").is_none());
    assert_eq!(report.benchmarks["json"].len(), 5);
    assert_eq!(report.benchmarks["io"].len(), 4);
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, RunWarning::MalformedMeasurement { benchmark, .. }
            if benchmark == "com.acme.io.File.writeLarge")));

    // Comparison ran against the two reports of the same version
    let comparison = report.comparison.as_ref().expect("comparison outcome");
    assert_eq!(comparison.baseline_version, "3.1.0");
    assert_eq!(comparison.baseline_reports, vec!["prev-2", "prev-1"]);
    assert_eq!(comparison.results.len(), 9);
    assert!(comparison
        .results
        .iter()
        .all(|r| r.evaluation != Evaluation::NoBaseline));
    assert!(report.warnings.contains(&RunWarning::InsufficientBaseline {
        requested: 5,
        available: 2
    }));

    // Every benchmark fingerprinted, but the malformed one blocks eligibility
    assert!(report
        .benchmarks
        .values()
        .flatten()
        .all(|b| b.fingerprint.is_complete()));
    assert!(!report.eligible_for_storing_externally);

    // No fatal error
    assert!(outcome.into_result().is_ok());
}

#[test]
fn test_scores_are_order_independent() {
    let forward = Engine::new().run(run_input(), &history()).report;

    let mut reversed_input = run_input();
    reversed_input.measurements.reverse();
    reversed_input.sources.reverse();
    let reversed = Engine::new().run(reversed_input, &history()).report;

    assert_eq!(forward.total_score, reversed.total_score);
    assert_eq!(forward.category_scores, reversed.category_scores);
    assert_eq!(forward.benchmarks, reversed.benchmarks);
    assert_eq!(forward.session_id, reversed.session_id);
}

#[test]
fn test_regression_in_one_category_fails_gate() {
    let mut input = run_input();
    for m in input.measurements.iter_mut().filter(|m| m.identifier.contains(".json.")) {
        m.score /= 2.0;
    }

    let outcome = Engine::new().run(input, &history());
    let offenders: Vec<String> = outcome
        .report
        .comparison
        .as_ref()
        .expect("comparison outcome")
        .anomalous()
        .map(|r| r.benchmark.clone())
        .collect();
    assert_eq!(offenders.len(), 5);
    assert!(offenders.iter().all(|id| id.contains(".json.")));

    match outcome.into_result() {
        Err(BenchError::TooManyAnomalies {
            count,
            allowed,
            offenders,
        }) => {
            assert_eq!(count, 5);
            assert_eq!(allowed, 1);
            assert_eq!(offenders.len(), 5);
        }
        other => panic!("Expected TooManyAnomalies, got {:?}", other),
    }
}

#[test]
fn test_between_versions_without_history_is_unevaluated() {
    let mut input = run_input();
    input.comparison = Some(RawComparisonConfig {
        scope: Some("BETWEEN".to_string()),
        compare_version: Some("2.0.0".to_string()),
        method: Some("DELTA".to_string()),
        threshold: Some("PERCENT_CHANGE".to_string()),
        baseline_reports: Some(3i64.into()),
        allowed_percent_change: Some(5.0f64.into()),
        allowed_anomalies: Some(1i64.into()),
        ..Default::default()
    });

    let outcome = Engine::new().run(input, &history());
    let comparison = outcome.report.comparison.as_ref().expect("comparison outcome");
    assert_eq!(comparison.unevaluated().count(), 9);
    assert!(comparison.verdict.is_pass());
    assert!(outcome.into_result().is_ok());
}
