//! Robust statistics
//!
//! All functions sort with `f64::total_cmp`, so results do not depend on the
//! input order.

/// Unweighted median. Even-length inputs average the two middle values.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Median absolute deviation around `center`.
pub fn mad(values: &[f64], center: f64) -> Option<f64> {
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations)
}

/// Stake-weighted median of `(value, weight)` samples.
///
/// Walks cumulative weight in value order and returns the value at which it
/// first reaches half the total. When it lands exactly on the midpoint the
/// larger of the two boundary values wins. A zero total weight falls back to
/// equal weights.
pub fn weighted_median(samples: &[(f64, f64)]) -> Option<f64> {
    let mut sorted: Vec<(f64, f64)> = samples
        .iter()
        .filter(|(value, _)| value.is_finite())
        .map(|&(value, weight)| {
            let weight = if weight.is_finite() && weight > 0.0 {
                weight
            } else {
                0.0
            };
            (value, weight)
        })
        .collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut total: f64 = sorted.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        for sample in sorted.iter_mut() {
            sample.1 = 1.0;
        }
        total = sorted.len() as f64;
    }

    let half = total / 2.0;
    let tolerance = total * 1e-12;
    let mut cumulative = 0.0;
    for (i, (value, weight)) in sorted.iter().enumerate() {
        cumulative += weight;
        if cumulative + tolerance < half {
            continue;
        }
        if (cumulative - half).abs() <= tolerance {
            if let Some((next, _)) = sorted.get(i + 1) {
                return Some(value.max(*next));
            }
        }
        return Some(*value);
    }
    sorted.last().map(|(value, _)| *value)
}

/// Keep-mask after MAD and band rejection around the median.
///
/// A zero MAD disables the MAD test; a zero median disables the band test.
/// Returns the median alongside the mask.
pub fn outlier_mask(values: &[f64], outlier_k: f64, band_pct: f64) -> Option<(f64, Vec<bool>)> {
    let center = median(values)?;
    let spread = mad(values, center)?;
    let mask = values
        .iter()
        .map(|v| {
            let deviation = (v - center).abs();
            let mad_reject = spread > 0.0 && deviation > outlier_k * spread;
            let band_reject = center > 0.0 && deviation / center > band_pct;
            !(mad_reject || band_reject)
        })
        .collect();
    Some((center, mask))
}

/// Relative deviation of `value` from `center`.
///
/// With a zero center any non-zero deviation counts as 100%.
pub fn relative_deviation(value: f64, center: f64) -> f64 {
    let deviation = (value - center).abs();
    if center > 0.0 {
        deviation / center
    } else if deviation > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Outlier-filtered stake-weighted median, without quorum gating.
pub fn robust_consensus(samples: &[(f64, f64)], outlier_k: f64, band_pct: f64) -> Option<f64> {
    let values: Vec<f64> = samples.iter().map(|(v, _)| *v).collect();
    let (_, mask) = outlier_mask(&values, outlier_k, band_pct)?;
    let survivors: Vec<(f64, f64)> = samples
        .iter()
        .zip(mask)
        .filter(|(_, keep)| *keep)
        .map(|(sample, _)| *sample)
        .collect();
    weighted_median(&survivors).or_else(|| weighted_median(samples))
}
