//! # Constituent Selector
//!
//! Incumbency-biased top-N selection. Incumbents that are still eligible keep
//! their seats; a challenger needs either a clear emission margin over the
//! lowest incumbent or a sustained run inside the naive top-N.
//!
//! ```text
//! ranked:  [C 120] [A 95] [B 90] [D 80]      prev = {A, B}, n = 2, margin 10%
//! lowest incumbent = B (90)  →  bar = 99
//! C: 120 ≥ 99 → admitted, set full → displaces weakest (B) since 120 ≥ 99
//! result:  [C, A]
//! ```

use crate::config::SelectionConfig;
use crate::domain::{ConstituentSelection, RankHistory};
use shared_types::AssetId;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Sort by descending emission, then ascending asset id. Duplicate ids keep
/// their first occurrence; non-finite emissions rank last.
pub fn rank_by_emission(emissions: &[(AssetId, f64)]) -> Vec<(AssetId, f64)> {
    let mut seen = BTreeSet::new();
    let mut ranked: Vec<(AssetId, f64)> = emissions
        .iter()
        .filter(|(asset_id, _)| seen.insert(*asset_id))
        .map(|(asset_id, emission)| {
            let emission = if emission.is_finite() {
                *emission
            } else {
                f64::NEG_INFINITY
            };
            (*asset_id, emission)
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    ranked
}

/// Choose up to `config.n` constituents from the eligible `ranked` assets.
///
/// `ranked` need not be sorted; it is ranked here. The returned history
/// increments every asset in this round's naive top-N and resets every
/// other known asset to zero.
pub fn select_top_n(
    ranked: &[(AssetId, f64)],
    prev_constituents: &BTreeSet<AssetId>,
    rank_history: &RankHistory,
    config: &SelectionConfig,
) -> ConstituentSelection {
    let ranked = rank_by_emission(ranked);
    let n = config.n;
    let emission: BTreeMap<AssetId, f64> = ranked.iter().copied().collect();
    let position: BTreeMap<AssetId, usize> = ranked
        .iter()
        .enumerate()
        .map(|(i, (asset_id, _))| (*asset_id, i))
        .collect();
    let history = |asset_id: AssetId| rank_history.get(&asset_id).copied().unwrap_or(0);

    let incumbents: Vec<AssetId> = ranked
        .iter()
        .map(|(asset_id, _)| *asset_id)
        .filter(|asset_id| prev_constituents.contains(asset_id))
        .take(n)
        .collect();
    let lowest_incumbent = incumbents.last().map(|asset_id| emission[asset_id]);

    let mut selected = incumbents.clone();
    for (challenger, challenger_emission) in ranked.iter().copied() {
        if selected.contains(&challenger) || incumbents.contains(&challenger) {
            continue;
        }
        let sustained = history(challenger) >= config.sustain_epochs;
        let clears_margin = match lowest_incumbent {
            None => true,
            Some(lowest) => challenger_emission >= lowest * (1.0 + config.margin_pct),
        };
        if !(clears_margin || sustained) {
            continue;
        }

        if selected.len() < n {
            debug!(asset_id = challenger, sustained, "Challenger admitted to free seat");
            selected.push(challenger);
            continue;
        }

        // Full: the weakest seat goes to a challenger that beats it.
        let Some((weakest_idx, weakest)) = selected
            .iter()
            .copied()
            .enumerate()
            .max_by_key(|(_, asset_id)| position[asset_id])
        else {
            continue;
        };
        let weakest_emission = emission[&weakest];
        let displaces = challenger_emission >= weakest_emission * (1.0 + config.margin_pct)
            || (sustained && challenger_emission > weakest_emission);
        if displaces {
            debug!(
                asset_id = challenger,
                displaced = weakest,
                sustained,
                "Challenger displaced weakest constituent"
            );
            selected[weakest_idx] = challenger;
        }
    }

    // Backfill by rank, regardless of margin or sustain.
    for (asset_id, _) in &ranked {
        if selected.len() >= n {
            break;
        }
        if !selected.contains(asset_id) {
            selected.push(*asset_id);
        }
    }
    selected.sort_by_key(|asset_id| position[asset_id]);

    let naive_top: BTreeSet<AssetId> = ranked.iter().take(n).map(|(a, _)| *a).collect();
    let mut next_history: RankHistory = rank_history.keys().map(|a| (*a, 0)).collect();
    for (asset_id, _) in &ranked {
        let count = if naive_top.contains(asset_id) {
            history(*asset_id).saturating_add(1)
        } else {
            0
        };
        next_history.insert(*asset_id, count);
    }

    ConstituentSelection {
        constituents: selected,
        rank_history: next_history,
    }
}
