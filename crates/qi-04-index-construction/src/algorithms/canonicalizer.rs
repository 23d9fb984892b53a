//! # Weight Canonicalizer
//!
//! Normalizes raw weights, converts them to exact basis points by largest
//! remainder and seals the result. A degenerate input never publishes: the
//! prior epoch's set is re-issued as frozen instead.

use crate::domain::{CanonicalizeError, Result, WeightOutcome, WeightSet, TOTAL_BPS};
use shared_types::{AssetId, Timestamp};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Basis points for normalized `weights`, summing to exactly 10 000.
///
/// Each asset gets `floor(w * 10000)`; leftover units go one at a time to the
/// largest fractional remainders, ties to the lower asset id.
pub fn largest_remainder_bps(weights: &BTreeMap<AssetId, f64>) -> Result<BTreeMap<AssetId, u32>> {
    if weights.is_empty() {
        return Err(CanonicalizeError::InvariantViolation {
            reason: "no weights to allocate".to_string(),
        });
    }

    let mut bps = BTreeMap::new();
    let mut remainders: Vec<(AssetId, f64)> = Vec::with_capacity(weights.len());
    for (asset_id, weight) in weights {
        let scaled = weight * f64::from(TOTAL_BPS);
        let floor = scaled.floor();
        bps.insert(*asset_id, floor as u32);
        remainders.push((*asset_id, scaled - floor));
    }

    // Largest remainder first, lowest asset id on ties.
    remainders.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    let allocated: u32 = bps.values().sum();
    if allocated <= TOTAL_BPS {
        let leftover = (TOTAL_BPS - allocated) as usize;
        for (asset_id, _) in remainders.iter().cycle().take(leftover) {
            if let Some(units) = bps.get_mut(asset_id) {
                *units += 1;
            }
        }
    } else {
        // Rounding pushed the floors over; take back from the smallest remainders.
        let excess = (allocated - TOTAL_BPS) as usize;
        let donors: Vec<AssetId> = remainders
            .iter()
            .rev()
            .map(|(asset_id, _)| *asset_id)
            .filter(|asset_id| bps.get(asset_id).is_some_and(|units| *units > 0))
            .take(excess)
            .collect();
        for asset_id in donors {
            if let Some(units) = bps.get_mut(&asset_id) {
                *units -= 1;
            }
        }
    }

    let total: u32 = bps.values().sum();
    if total != TOTAL_BPS {
        return Err(CanonicalizeError::InvariantViolation {
            reason: format!("largest remainder allocated {total} bps"),
        });
    }
    Ok(bps)
}

/// Build this epoch's weight set for `selection`.
///
/// Raw weights of assets outside `selection` are ignored; a selected asset
/// with no raw weight counts as zero. Fewer than `n` selected assets, or a
/// zero total, freezes to `prior`. A total that overflows `f64` is an error.
pub fn to_weight_set(
    epoch_id: u64,
    as_of: Timestamp,
    selection: &[AssetId],
    raw_weights: &BTreeMap<AssetId, f64>,
    n: usize,
    prior: Option<&WeightSet>,
) -> Result<WeightOutcome> {
    let mut selected: BTreeMap<AssetId, f64> = BTreeMap::new();
    for asset_id in selection {
        let raw = raw_weights.get(asset_id).copied().unwrap_or(0.0);
        if !raw.is_finite() || raw < 0.0 {
            return Err(CanonicalizeError::InvalidWeight {
                asset_id: *asset_id,
                value: raw,
            });
        }
        selected.insert(*asset_id, raw);
    }
    let total: f64 = selected.values().sum();
    if !total.is_finite() {
        return Err(CanonicalizeError::WeightOverflow { total });
    }

    let degenerate = if selected.len() < n {
        Some(format!("{} of {} constituents selected", selected.len(), n))
    } else if selected.is_empty() || total <= 0.0 {
        Some("zero total weight".to_string())
    } else {
        None
    };

    if let Some(reason) = degenerate {
        let Some(prior) = prior else {
            warn!(epoch_id, %reason, "Degenerate weights with no prior weight set");
            return Err(CanonicalizeError::NoPriorSnapshot { epoch_id });
        };
        warn!(
            epoch_id,
            prior_epoch = prior.epoch_id,
            %reason,
            "Degenerate weights, freezing to previous snapshot"
        );
        return Ok(WeightOutcome::Frozen(WeightSet::frozen_from(
            prior, epoch_id, as_of,
        )?));
    }

    let weights: BTreeMap<AssetId, f64> = selected
        .into_iter()
        .map(|(asset_id, raw)| (asset_id, raw / total))
        .collect();
    let weights_bps = largest_remainder_bps(&weights)?;
    let set = WeightSet::computed(epoch_id, as_of, weights, weights_bps)?;
    set.verify_against(selection)?;

    info!(
        epoch_id,
        constituents = set.len(),
        content_hash = %set.content_hash,
        "Weight set computed"
    );
    Ok(WeightOutcome::Published(set))
}
