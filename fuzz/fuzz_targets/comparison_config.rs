#![no_main]

use benchgate::regression::RawComparisonConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary text as a [comparison] table
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(raw) = toml::from_str::<RawComparisonConfig>(input) {
            // Must return a config or a named error, never panic
            let _ = raw.validate();
        }
    }
});
