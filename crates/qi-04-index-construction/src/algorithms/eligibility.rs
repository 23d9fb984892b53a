//! Eligibility Filter
//!
//! Continuity, not average: one zero or missing day in the trailing window
//! disqualifies the asset for this run.

use crate::config::EligibilityConfig;
use crate::domain::EligibilityRecord;
use shared_types::AssetId;
use std::collections::BTreeMap;

/// True iff every one of the last `required_days` values is strictly positive.
///
/// A series shorter than `required_days` is missing days and fails. An
/// override, when present, decides alone.
pub fn is_eligible(series: &[f64], required_days: usize, override_: Option<bool>) -> bool {
    if let Some(forced) = override_ {
        return forced;
    }
    continuous(series, required_days)
}

fn continuous(series: &[f64], required_days: usize) -> bool {
    if required_days == 0 || series.len() < required_days {
        return false;
    }
    series[series.len() - required_days..]
        .iter()
        .all(|v| v.is_finite() && *v > 0.0)
}

/// Eligibility record for every asset with a series or an override.
pub fn evaluate_eligibility(
    series: &BTreeMap<AssetId, Vec<f64>>,
    config: &EligibilityConfig,
) -> BTreeMap<AssetId, EligibilityRecord> {
    let mut records: BTreeMap<AssetId, EligibilityRecord> = series
        .iter()
        .map(|(asset_id, days)| {
            (
                *asset_id,
                EligibilityRecord {
                    continuous_days_met: continuous(days, config.required_days),
                    override_: config.override_for(*asset_id),
                },
            )
        })
        .collect();

    for (asset_id, forced) in &config.overrides {
        records.entry(*asset_id).or_insert(EligibilityRecord {
            continuous_days_met: false,
            override_: Some(*forced),
        });
    }
    records
}
