#![no_main]

use benchgate::regression::{Method, RawComparisonConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|raw: RawComparisonConfig| {
    if let Ok(validated) = raw.validate() {
        let config = validated.config;
        assert!(config.baseline_reports >= 1);
        assert!(config.allowed_anomalies >= 1);
        if let Method::StdDev { allowed_deviations } = config.method {
            assert!(allowed_deviations > 0.0 && allowed_deviations.is_finite());
        }
    }
});
