//! # Rebalance Quorum Gate
//!
//! An asset fails when the stake reporting inside this rebalance is below
//! `quorum_fraction` of all stake ever seen reporting on it. Stake belongs to
//! a reporter, so each reporter counts once per asset however many reports
//! it filed. Failures are returned in full; the caller pauses those assets
//! or, when configured to fail closed, aborts the rebalance.

use crate::config::QuorumGateConfig;
use crate::domain::QuorumReport;
use qi_01_epoch_clock::EpochSchedule;
use shared_types::{AssetId, Observation, ReporterId};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Default)]
struct ReporterStake {
    stake: f64,
    in_rebalance: bool,
}

pub fn check_rebalance_quorum(
    schedule: &EpochSchedule,
    rebalance_id: u64,
    observations: &[Observation],
    config: &QuorumGateConfig,
) -> QuorumReport {
    let mut by_asset: BTreeMap<AssetId, BTreeMap<&ReporterId, ReporterStake>> = BTreeMap::new();
    for obs in observations {
        let entry = by_asset
            .entry(obs.asset_id)
            .or_default()
            .entry(&obs.reporter_id)
            .or_default();
        entry.stake = entry.stake.max(obs.declared_stake);
        if matches!(schedule.rebalance_id(obs.windowing_instant()), Ok(id) if id == rebalance_id) {
            entry.in_rebalance = true;
        }
    }

    let mut report = QuorumReport {
        rebalance_id,
        ..Default::default()
    };
    for (asset_id, reporters) in by_asset {
        let total: f64 = reporters.values().map(|r| r.stake).sum();
        let current: f64 = reporters
            .values()
            .filter(|r| r.in_rebalance)
            .map(|r| r.stake)
            .sum();
        let participation = if total > 0.0 { current / total } else { 0.0 };
        report.participation.insert(asset_id, participation);
        if total <= 0.0 || current < config.quorum_fraction * total {
            report.failed_asset_ids.insert(asset_id);
        }
    }
    report.passed = report.failed_asset_ids.is_empty();

    if !report.passed {
        warn!(
            rebalance_id,
            failed = report.failed_asset_ids.len(),
            "Rebalance quorum not met for some assets"
        );
    }
    report
}
