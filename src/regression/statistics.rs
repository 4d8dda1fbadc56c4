// Baseline statistics for regression comparison
//
// Wraps trueno's SIMD vector primitives. trueno works in f32, so samples are
// centred on the first score in f64 and only the deltas are handed over; the
// reference is added back to the mean. trueno reports population variance
// (divide by n); the comparator needs the sample standard deviation, so the
// variance is rescaled by n / (n - 1).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use trueno::Vector;

/// Mean and spread of one benchmark's baseline scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineStats {
    /// Number of baseline scores
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Sample standard deviation (0 for a single score)
    pub std_dev: f64,
}

/// Compute mean and sample standard deviation of baseline scores
///
/// # Example
/// ```
/// use benchgate::regression::baseline_stats;
///
/// let stats = baseline_stats(&[100.0, 100.0, 100.0, 100.0]).unwrap();
/// assert_eq!(stats.mean, 100.0);
/// assert_eq!(stats.std_dev, 0.0);
/// ```
pub fn baseline_stats(scores: &[f64]) -> Result<BaselineStats> {
    if scores.is_empty() {
        anyhow::bail!("Cannot compute statistics of an empty baseline");
    }
    if scores.iter().any(|s| !s.is_finite()) {
        anyhow::bail!("Baseline contains non-finite scores");
    }

    let reference = scores[0];
    let deltas: Vec<f32> = scores.iter().map(|s| (s - reference) as f32).collect();
    if deltas.iter().any(|d| !d.is_finite()) {
        anyhow::bail!("Baseline spread exceeds the representable range");
    }
    let vector = Vector::from_slice(&deltas);

    let mean_delta = vector.mean().context("Failed to compute baseline mean")?;
    let std_dev = if deltas.len() < 2 {
        0.0
    } else {
        let population = vector
            .variance()
            .context("Failed to compute baseline variance")? as f64;
        let n = deltas.len() as f64;
        (population.max(0.0) * n / (n - 1.0)).sqrt()
    };

    Ok(BaselineStats {
        count: scores.len(),
        mean: reference + mean_delta as f64,
        std_dev,
    })
}
