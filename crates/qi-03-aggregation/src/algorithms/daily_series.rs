//! Trailing per-day consensus series
//!
//! Emission observations are bucketed by the epoch clock's anchor-aligned day
//! index. Each day's value is the outlier-filtered stake-weighted median of
//! that day's reports, one per reporter (its latest of the day). A day with
//! no reports is `0.0`, not skipped.
//! Offenses are not produced here; each report is judged once, in the live
//! window.

use super::aggregator::freshest_per_reporter;
use super::robust_stats::robust_consensus;
use crate::config::AggregationParams;
use qi_01_epoch_clock::{EpochError, EpochSchedule};
use rayon::prelude::*;
use shared_types::{AssetId, Metric, Observation, ReporterId, Timestamp};
use std::collections::{BTreeMap, HashMap};

/// Series of the last `days` complete days before `now`, oldest first, for
/// every asset with at least one emission observation.
pub fn daily_consensus_series<F>(
    schedule: &EpochSchedule,
    observations: &[Observation],
    now: Timestamp,
    days: usize,
    effective_stake: F,
    params: &AggregationParams,
) -> Result<BTreeMap<AssetId, Vec<f64>>, EpochError>
where
    F: Fn(&ReporterId) -> f64 + Sync,
{
    let last_complete_day = schedule.day_index(now)? as i64 - 1;
    let first_day = last_complete_day - days as i64 + 1;

    let mut buckets: HashMap<AssetId, BTreeMap<i64, Vec<&Observation>>> = HashMap::new();
    for obs in observations.iter().filter(|o| o.metric == Metric::Emission) {
        let Ok(day) = schedule.day_index(obs.windowing_instant()) else {
            continue;
        };
        let day = day as i64;
        if day < first_day || day > last_complete_day {
            continue;
        }
        buckets
            .entry(obs.asset_id)
            .or_default()
            .entry(day)
            .or_default()
            .push(obs);
    }

    let series = buckets
        .into_par_iter()
        .map(|(asset_id, by_day)| {
            let values = (first_day..=last_complete_day)
                .map(|day| {
                    by_day
                        .get(&day)
                        .and_then(|reports| {
                            let samples: Vec<(f64, f64)> =
                                freshest_per_reporter(reports.iter().copied())
                                    .into_iter()
                                    .map(|obs| {
                                        let weight = obs.declared_stake.max(0.0)
                                            * effective_stake(&obs.reporter_id);
                                        (obs.value, weight)
                                    })
                                    .collect();
                            robust_consensus(&samples, params.outlier_k, params.band_pct)
                        })
                        .unwrap_or(0.0)
                })
                .collect::<Vec<f64>>();
            (asset_id, values)
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect();

    Ok(series)
}
