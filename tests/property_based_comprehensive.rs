//! Comprehensive property-based tests for pre-commit hook
//!
//! This test suite covers the core guarantees of benchgate using
//! property-based testing with proptest. Designed to run under 30 seconds
//! as a pre-commit quality gate.
//!
//! Core properties tested:
//! 1. Fingerprint determinism and sensitivity
//! 2. Aggregation commutativity and monotonicity
//! 3. Config validation never panics and never guesses
//! 4. NoBaseline benchmarks never count as anomalies
//! 5. Baseline selection determinism

use benchgate::fingerprint::FingerprintGenerator;
use benchgate::measurement::Measurement;
use benchgate::regression::{
    select_baseline, AnomalyGate, ComparisonConfig, Evaluation, HistoryRecord, InMemoryHistory,
    Method, RawComparisonConfig, RegressionComparator, Scope, Threshold,
};
use benchgate::scoring::{combine, ScoreAggregator};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn score() -> impl Strategy<Value = f64> {
    0.001f64..1.0e6
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_fingerprint_deterministic(
        declared in prop::collection::vec(any::<u8>(), 0..256),
        body in prop::collection::vec(any::<u8>(), 0..256),
        container in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        // Property: identical input always yields identical fingerprint
        let generator = FingerprintGenerator::new();
        let a = generator.fingerprint(&declared, &body, &container);
        let b = FingerprintGenerator::new().fingerprint(&declared, &body, &container);
        prop_assert_eq!(a, b);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_structural_fingerprint_sensitive_to_instructions(
        body in prop::collection::vec("[a-z_]{1,12}( [0-9]{1,3})?", 1..20),
        index in any::<prop::sample::Index>(),
    ) {
        // Property: changing any instruction changes the structural hash
        let generator = FingerprintGenerator::new();
        let original = body.join("\n");

        let mut changed = body.clone();
        let i = index.index(changed.len());
        changed[i].push_str("_x");
        let changed = changed.join("\n");

        prop_assert_ne!(
            generator.structural_hash(original.as_bytes()),
            generator.structural_hash(changed.as_bytes())
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_binary_body_sensitive_to_any_byte(
        body in prop::collection::vec(any::<u8>(), 1..128),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        // Property: non-text bodies are hashed verbatim, so any byte flip shows
        let generator = FingerprintGenerator::new();
        let mut binary = vec![0xFFu8];
        binary.extend(&body);
        let mut changed = binary.clone();
        let i = index.index(changed.len() - 1) + 1;
        changed[i] ^= flip;

        if std::str::from_utf8(&changed).is_err() {
            prop_assert_ne!(
                generator.structural_hash(&binary),
                generator.structural_hash(&changed)
            );
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_combine_commutative(
        scores in prop::collection::vec(score(), 1..20),
        seed in any::<u64>(),
    ) {
        // Property: permuting inputs never changes the combined score
        let mut shuffled = scores.clone();
        let len = shuffled.len();
        let mut state = seed;
        for i in (1..len).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let j = (state >> 33) as usize % (i + 1);
            shuffled.swap(i, j);
        }
        prop_assert_eq!(combine(&scores), combine(&shuffled));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_combine_monotonic(
        scores in prop::collection::vec(score(), 1..20),
        index in any::<prop::sample::Index>(),
        increase in 1.0f64..1.0e6,
    ) {
        // Property: raising one score never lowers the combined score
        let before = combine(&scores);
        let mut raised = scores.clone();
        let i = index.index(raised.len());
        raised[i] += increase;
        prop_assert!(combine(&raised) >= before);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_aggregate_order_independent(
        entries in prop::collection::btree_map("[a-z]{3,8}", (score(), 0usize..3), 1..15),
    ) {
        // Property: per-category and overall scores ignore measurement order
        let categories = ["io", "json", "cpu"];
        let measurements: Vec<Measurement> = entries
            .iter()
            .map(|(name, (s, c))| Measurement::new(format!("b.{}", name), *s).with_category(categories[*c]))
            .collect();
        let mut reversed = measurements.clone();
        reversed.reverse();

        let aggregator = ScoreAggregator::new();
        let a = aggregator.aggregate(&measurements);
        let b = aggregator.aggregate(&reversed);
        prop_assert_eq!(a.per_category, b.per_category);
        prop_assert_eq!(a.overall, b.overall);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_config_validation_never_panics(
        scope in prop::option::of("(WITHIN|BETWEEN|within|[A-Z]{0,6})"),
        compare_version in prop::option::of("[0-9.]{0,5}"),
        method in prop::option::of("(SD|DELTA|sd|[A-Z]{0,4})"),
        threshold in prop::option::of("(PERCENT_CHANGE|[A-Z]{0,4})"),
        baseline_reports in prop::option::of(-3i64..10),
        deviations in prop::option::of(-2.0f64..5.0),
        percent in prop::option::of(-2.0f64..50.0),
        anomalies in prop::option::of(-3i64..10),
    ) {
        // Property: validation either yields a config satisfying every rule
        // or a named error; it never substitutes defaults
        let raw = RawComparisonConfig {
            scope,
            compare_version,
            method,
            threshold,
            baseline_reports: baseline_reports.map(Into::into),
            allowed_deviations: deviations.map(Into::into),
            allowed_percent_change: percent.map(Into::into),
            allowed_anomalies: anomalies.map(Into::into),
        };

        if let Ok(validated) = raw.validate() {
            let config = validated.config;
            prop_assert!(config.baseline_reports >= 1);
            prop_assert!(config.allowed_anomalies >= 1);
            prop_assert_eq!(Some(config.baseline_reports as i64), baseline_reports);
            prop_assert_eq!(Some(config.allowed_anomalies as i64), anomalies);
            match config.method {
                Method::StdDev { allowed_deviations } => {
                    prop_assert!(allowed_deviations > 0.0);
                    prop_assert_eq!(Some(allowed_deviations), deviations);
                }
                Method::Delta { threshold: Threshold::PercentChange { allowed_percent_change } } => {
                    prop_assert!(allowed_percent_change > 0.0);
                    prop_assert_eq!(Some(allowed_percent_change), percent);
                }
            }
            if let Scope::Between { compare_version } = config.scope {
                prop_assert!(!compare_version.trim().is_empty());
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_no_baseline_never_anomalous(
        current in prop::collection::vec(prop_oneof![score(), Just(0.0), Just(1.0e15)], 1..20),
        k in 0.01f64..5.0,
    ) {
        // Property: without history nothing can be an anomaly
        let comparator = RegressionComparator::new(Method::StdDev { allowed_deviations: k });
        let results: Vec<_> = current
            .iter()
            .enumerate()
            .map(|(i, s)| comparator.evaluate(&format!("b{}", i), *s, &[]))
            .collect();

        prop_assert!(results.iter().all(|r| r.evaluation == Evaluation::NoBaseline));
        prop_assert!(AnomalyGate::new(1).gate(&results).is_pass());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_baseline_selection_deterministic(
        timestamps in prop::collection::vec(0u64..20, 0..15),
        count in 1usize..8,
    ) {
        // Property: shuffled history yields the same baseline
        let records: Vec<HistoryRecord> = timestamps
            .iter()
            .enumerate()
            .map(|(i, ts)| HistoryRecord {
                report_id: format!("r{:02}", i),
                project: "p".to_string(),
                version: "1".to_string(),
                timestamp: *ts,
                scores: BTreeMap::from([("b".to_string(), i as f64)]),
            })
            .collect();
        let mut reversed = records.clone();
        reversed.reverse();

        let config = ComparisonConfig {
            scope: Scope::Within,
            method: Method::StdDev { allowed_deviations: 2.0 },
            baseline_reports: count,
            allowed_anomalies: 1,
        };
        let a = select_baseline(&config, "p", "1", None, &InMemoryHistory::new(records)).unwrap();
        let b = select_baseline(&config, "p", "1", None, &InMemoryHistory::new(reversed)).unwrap();

        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.available(), count.min(timestamps.len()));
    }
}
