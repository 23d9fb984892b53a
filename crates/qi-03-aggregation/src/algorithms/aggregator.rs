//! # Robust Aggregator
//!
//! Per asset:
//! 1. Partition into in-window (`[now - window, now]`, not older than
//!    `stale_after`) and the rest; keep the freshest report per reporter.
//! 2. No in-window reports: all-time weighted median over each reporter's
//!    latest report, coverage 0.
//! 3. Median + MAD and band rejection; one `OutlierOffense` per drop.
//! 4. Stake-weighted median of survivors using reputation-scaled stake.
//! 5. Coverage under `quorum_threshold`: all-time fallback, coverage kept.
//! 6. Staleness from the freshest report considered, survivors or not.

use super::robust_stats::{outlier_mask, relative_deviation, weighted_median};
use crate::config::AggregationParams;
use crate::domain::{
    AggregationContext, AggregationOutcome, BatchOutcome, ConsensusResult, ConsensusSource,
};
use rayon::prelude::*;
use shared_types::{
    duration_from_secs, AssetId, Metric, Observation, OutlierOffense, ReporterId, Timestamp,
};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Aggregate one asset's observations of one metric.
///
/// `effective_stake` returns the reputation multiplier for a reporter.
/// Returns `None` when the asset has no observations at all.
pub fn aggregate<F>(
    asset_id: AssetId,
    metric: Metric,
    observations: &[Observation],
    effective_stake: F,
    params: &AggregationParams,
    ctx: &AggregationContext,
) -> Option<AggregationOutcome>
where
    F: Fn(&ReporterId) -> f64,
{
    let relevant: Vec<&Observation> = observations
        .iter()
        .filter(|o| o.asset_id == asset_id && o.metric == metric)
        .collect();
    if relevant.is_empty() {
        return None;
    }

    let stake_of = |o: &Observation| o.declared_stake.max(0.0) * effective_stake(&o.reporter_id);

    let freshest = relevant.iter().map(|o| o.windowing_instant()).max()?;
    let staleness_seconds = (ctx.now - freshest).num_seconds().max(0) as u64;

    let all_time: Vec<(f64, f64)> = freshest_per_reporter(relevant.iter().copied())
        .into_iter()
        .map(|o| (o.value, stake_of(o)))
        .collect();

    let in_window = fresh_per_reporter(&relevant, params, ctx);
    if in_window.is_empty() {
        let value = weighted_median(&all_time)?;
        debug!(asset_id, %metric, value, "No in-window observations, all-time fallback");
        return Some(AggregationOutcome {
            result: ConsensusResult {
                asset_id,
                metric,
                value,
                quorum_coverage: 0.0,
                staleness_seconds,
                source: ConsensusSource::NoFreshData,
            },
            offenses: Vec::new(),
        });
    }

    let values: Vec<f64> = in_window.iter().map(|o| o.value).collect();
    let (center, mask) = outlier_mask(&values, params.outlier_k, params.band_pct)?;

    let mut offenses = Vec::new();
    let mut survivors = Vec::new();
    for (&obs, keep) in in_window.iter().zip(mask) {
        if keep {
            survivors.push((obs.value, stake_of(obs)));
            continue;
        }
        offenses.push(OutlierOffense {
            reporter_id: obs.reporter_id.clone(),
            asset_id,
            metric,
            reported_value: obs.value,
            consensus_median: center,
            pct_deviation: relative_deviation(obs.value, center),
            at: ctx.now,
        });
    }

    let surviving_stake: f64 = survivors.iter().map(|(_, stake)| stake).sum();
    let quorum_coverage = if ctx.total_known_stake > 0.0 {
        (surviving_stake / ctx.total_known_stake).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let window_value = if quorum_coverage >= params.quorum_threshold {
        weighted_median(&survivors)
    } else {
        None
    };

    let (value, source) = match window_value {
        Some(value) => (value, ConsensusSource::Window),
        None => (weighted_median(&all_time)?, ConsensusSource::QuorumFallback),
    };

    debug!(
        asset_id,
        %metric,
        value,
        coverage = quorum_coverage,
        survivors = survivors.len(),
        rejected = offenses.len(),
        ?source,
        "Asset aggregated"
    );

    Some(AggregationOutcome {
        result: ConsensusResult {
            asset_id,
            metric,
            value,
            quorum_coverage,
            staleness_seconds,
            source,
        },
        offenses,
    })
}

/// In-window observations, one per reporter (the freshest), ordered by reporter.
fn fresh_per_reporter<'a>(
    relevant: &[&'a Observation],
    params: &AggregationParams,
    ctx: &AggregationContext,
) -> Vec<&'a Observation> {
    let window_start = lower_bound(ctx.now, params.window_secs);
    let stale_cutoff = lower_bound(ctx.now, params.stale_after_secs);
    let too_old = |at: Timestamp, bound: Option<Timestamp>| bound.is_some_and(|b| at < b);

    freshest_per_reporter(relevant.iter().copied().filter(|obs| {
        let at = obs.windowing_instant();
        at <= ctx.now && !too_old(at, window_start) && !too_old(at, stale_cutoff)
    }))
}

/// `now - secs`, or `None` when the span reaches past representable time.
fn lower_bound(now: Timestamp, secs: u64) -> Option<Timestamp> {
    duration_from_secs(secs).and_then(|span| now.checked_sub_signed(span))
}

/// Latest observation of each reporter, ordered by reporter.
///
/// Ties on the windowing instant go to the larger value so the pick does not
/// depend on input order.
pub(crate) fn freshest_per_reporter<'a, I>(observations: I) -> Vec<&'a Observation>
where
    I: IntoIterator<Item = &'a Observation>,
{
    let mut latest: BTreeMap<&'a ReporterId, &'a Observation> = BTreeMap::new();
    for obs in observations {
        let at = obs.windowing_instant();
        let replace = match latest.get(&obs.reporter_id) {
            None => true,
            Some(current) => {
                let current_at = current.windowing_instant();
                at > current_at || (at == current_at && obs.value > current.value)
            }
        };
        if replace {
            latest.insert(&obs.reporter_id, obs);
        }
    }
    latest.into_values().collect()
}

/// Aggregate every asset of `metric` in the batch, assets in parallel.
///
/// Output ordering matches a sequential run.
pub fn aggregate_batch<F>(
    metric: Metric,
    observations: &[Observation],
    effective_stake: F,
    params: &AggregationParams,
    ctx: &AggregationContext,
) -> BatchOutcome
where
    F: Fn(&ReporterId) -> f64 + Sync,
{
    let mut by_asset: HashMap<AssetId, Vec<Observation>> = HashMap::new();
    for obs in observations.iter().filter(|o| o.metric == metric) {
        by_asset.entry(obs.asset_id).or_default().push(obs.clone());
    }

    let outcomes: BTreeMap<AssetId, AggregationOutcome> = by_asset
        .into_par_iter()
        .filter_map(|(asset_id, group)| {
            aggregate(asset_id, metric, &group, &effective_stake, params, ctx)
                .map(|outcome| (asset_id, outcome))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect();

    let mut batch = BatchOutcome::default();
    for (asset_id, outcome) in outcomes {
        batch.offenses.extend(outcome.offenses);
        batch.results.insert(asset_id, outcome.result);
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn obs(reporter: &str, asset: AssetId, value: f64, stake: f64, age_secs: i64) -> Observation {
        Observation::new(
            reporter,
            asset,
            Metric::Price,
            value,
            stake,
            now() - Duration::seconds(age_secs),
        )
    }

    fn full_trust(_: &ReporterId) -> f64 {
        1.0
    }

    fn ctx(total: f64) -> AggregationContext {
        AggregationContext {
            now: now(),
            total_known_stake: total,
        }
    }

    #[test]
    fn test_no_observations_is_absent() {
        let result = aggregate(
            1,
            Metric::Price,
            &[],
            full_trust,
            &AggregationParams::default(),
            &ctx(10.0),
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_outlier_excluded_from_median() {
        let batch: Vec<_> = ["a", "b", "c", "d"]
            .iter()
            .map(|r| obs(r, 1, 100.0, 1.0, 60))
            .chain(std::iter::once(obs("e", 1, 10_000.0, 1.0, 60)))
            .collect();

        let outcome = aggregate(
            1,
            Metric::Price,
            &batch,
            full_trust,
            &AggregationParams::default(),
            &ctx(5.0),
        )
        .unwrap();

        assert_eq!(outcome.result.value, 100.0);
        assert_eq!(outcome.result.source, ConsensusSource::Window);
        assert_eq!(outcome.offenses.len(), 1);
        assert_eq!(outcome.offenses[0].reporter_id, ReporterId::new("e"));
        assert!((outcome.result.quorum_coverage - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_three_reporter_scenario() {
        let batch = vec![
            obs("alpha", 7, 10.0, 100.0, 30),
            obs("beta", 7, 10.1, 50.0, 30),
            obs("gamma", 7, 25.0, 5.0, 30),
        ];
        let params = AggregationParams {
            band_pct: 0.2,
            outlier_k: 5.0,
            quorum_threshold: 0.33,
            ..Default::default()
        };

        let outcome = aggregate(7, Metric::Price, &batch, full_trust, &params, &ctx(155.0)).unwrap();

        assert_eq!(outcome.result.value, 10.0);
        assert!((outcome.result.quorum_coverage - 150.0 / 155.0).abs() < 1e-9);
        assert_eq!(outcome.offenses.len(), 1);
        let offense = &outcome.offenses[0];
        assert_eq!(offense.reporter_id, ReporterId::new("gamma"));
        assert_eq!(offense.consensus_median, 10.1);
        assert!(offense.pct_deviation > 1.0);
    }

    #[test]
    fn test_quorum_fallback_reports_actual_coverage() {
        // One fresh reporter with 10% of known stake; history says 50.
        let batch = vec![
            obs("fresh", 3, 80.0, 10.0, 60),
            obs("old-1", 3, 50.0, 45.0, 50_000),
            obs("old-2", 3, 50.0, 45.0, 50_000),
        ];

        let outcome = aggregate(
            3,
            Metric::Price,
            &batch,
            full_trust,
            &AggregationParams::default(),
            &ctx(100.0),
        )
        .unwrap();

        assert_eq!(outcome.result.source, ConsensusSource::QuorumFallback);
        assert_eq!(outcome.result.value, 50.0);
        assert!((outcome.result.quorum_coverage - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_no_fresh_data_falls_back_with_zero_coverage() {
        let batch = vec![obs("a", 2, 5.0, 1.0, 90_000), obs("b", 2, 6.0, 3.0, 90_000)];

        let outcome = aggregate(
            2,
            Metric::Price,
            &batch,
            full_trust,
            &AggregationParams::default(),
            &ctx(4.0),
        )
        .unwrap();

        assert_eq!(outcome.result.source, ConsensusSource::NoFreshData);
        assert_eq!(outcome.result.quorum_coverage, 0.0);
        assert_eq!(outcome.result.value, 6.0);
        assert_eq!(outcome.result.staleness_seconds, 90_000);
    }

    #[test]
    fn test_staleness_uses_freshest_even_if_rejected() {
        let batch = vec![
            obs("a", 1, 100.0, 1.0, 600),
            obs("b", 1, 100.0, 1.0, 600),
            obs("c", 1, 100.0, 1.0, 600),
            obs("liar", 1, 900.0, 1.0, 5),
        ];
        let outcome = aggregate(
            1,
            Metric::Price,
            &batch,
            full_trust,
            &AggregationParams::default(),
            &ctx(4.0),
        )
        .unwrap();
        assert_eq!(outcome.offenses.len(), 1);
        assert_eq!(outcome.result.staleness_seconds, 5);
    }

    #[test]
    fn test_reputation_scales_stake() {
        let batch = vec![obs("heavy", 1, 10.0, 60.0, 10), obs("light", 1, 11.0, 50.0, 10)];
        let distrust_heavy = |r: &ReporterId| if r.as_str() == "heavy" { 0.5 } else { 1.0 };

        let outcome = aggregate(
            1,
            Metric::Price,
            &batch,
            distrust_heavy,
            &AggregationParams::default(),
            &ctx(110.0),
        )
        .unwrap();

        // heavy: 30 effective, light: 50 effective
        assert_eq!(outcome.result.value, 11.0);
        assert!((outcome.result.quorum_coverage - 80.0 / 110.0).abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_reports_count_once() {
        let batch = vec![
            obs("a", 1, 10.0, 10.0, 100),
            obs("a", 1, 10.0, 10.0, 50),
            obs("b", 1, 10.0, 10.0, 50),
        ];
        let outcome = aggregate(
            1,
            Metric::Price,
            &batch,
            full_trust,
            &AggregationParams::default(),
            &ctx(20.0),
        )
        .unwrap();
        assert!((outcome.result.quorum_coverage - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_every_report_rejected_falls_back() {
        let batch = vec![obs("low", 1, 1.0, 1.0, 60), obs("high", 1, 3.0, 1.0, 60)];
        let params = AggregationParams {
            band_pct: 0.2,
            ..Default::default()
        };

        let outcome = aggregate(1, Metric::Price, &batch, full_trust, &params, &ctx(2.0)).unwrap();

        assert_eq!(outcome.result.source, ConsensusSource::QuorumFallback);
        assert_eq!(outcome.result.quorum_coverage, 0.0);
        assert_eq!(outcome.result.value, 3.0);
        assert_eq!(outcome.offenses.len(), 2);
    }

    #[test]
    fn test_empty_survivors_with_zero_threshold() {
        let batch = vec![obs("low", 1, 1.0, 1.0, 60), obs("high", 1, 3.0, 1.0, 60)];
        let params = AggregationParams {
            band_pct: 0.2,
            quorum_threshold: 0.0,
            ..Default::default()
        };

        let outcome = aggregate(1, Metric::Price, &batch, full_trust, &params, &ctx(2.0)).unwrap();

        // Coverage 0 meets a zero threshold, but there is nothing to take a median of.
        assert_eq!(outcome.result.source, ConsensusSource::QuorumFallback);
        assert_eq!(outcome.result.quorum_coverage, 0.0);
        assert_eq!(outcome.offenses.len(), 2);
    }

    #[test]
    fn test_all_time_fallback_counts_each_reporter_once() {
        let mut batch: Vec<_> = (0..10)
            .map(|i| obs("spammer", 1, 0.0, 1.0, 90_000 + i))
            .collect();
        batch.push(obs("honest", 1, 10.0, 2.0, 90_000));

        let outcome = aggregate(
            1,
            Metric::Price,
            &batch,
            full_trust,
            &AggregationParams::default(),
            &ctx(3.0),
        )
        .unwrap();

        assert_eq!(outcome.result.source, ConsensusSource::NoFreshData);
        assert_eq!(outcome.result.value, 10.0);
    }

    #[test]
    fn test_oversized_window_covers_all_history() {
        let batch = vec![obs("a", 1, 4.0, 1.0, 400_000_000), obs("b", 1, 4.0, 1.0, 10)];
        let params = AggregationParams {
            window_secs: u64::MAX,
            stale_after_secs: u64::MAX,
            ..Default::default()
        };

        let outcome = aggregate(1, Metric::Price, &batch, full_trust, &params, &ctx(2.0)).unwrap();

        assert_eq!(outcome.result.source, ConsensusSource::Window);
        assert_eq!(outcome.result.quorum_coverage, 1.0);
    }

    #[test]
    fn test_batch_is_deterministic_and_per_asset() {
        let mut batch = Vec::new();
        for asset in 0..20u32 {
            for r in 0..5 {
                batch.push(obs(&format!("r{r}"), asset, 10.0 + asset as f64, 1.0, 10));
            }
            batch.push(obs("liar", asset, 1_000.0, 1.0, 10));
        }

        let params = AggregationParams::default();
        let first = aggregate_batch(Metric::Price, &batch, full_trust, &params, &ctx(6.0));
        batch.reverse();
        let second = aggregate_batch(Metric::Price, &batch, full_trust, &params, &ctx(6.0));

        assert_eq!(first, second);
        assert_eq!(first.results.len(), 20);
        assert_eq!(first.offenses.len(), 20);
        assert_eq!(first.results[&4].value, 14.0);
        let assets: Vec<_> = first.offenses.iter().map(|o| o.asset_id).collect();
        let mut sorted = assets.clone();
        sorted.sort();
        assert_eq!(assets, sorted);
    }

    #[test]
    fn test_batch_ignores_other_metric() {
        let batch = vec![Observation::new("a", 1, Metric::Emission, 5.0, 1.0, now())];
        let out = aggregate_batch(
            Metric::Price,
            &batch,
            full_trust,
            &AggregationParams::default(),
            &ctx(1.0),
        );
        assert!(out.results.is_empty());
    }
}
