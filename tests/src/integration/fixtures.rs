//! Shared scenario builders for the integration flows.

#![cfg(test)]

use chrono::{Duration, TimeZone, Utc};
use qi_01_epoch_clock::ManualClock;
use qi_05_rebalance::{
    InMemoryAuditLog, InMemoryObservationSource, InMemoryStateStore, RebalanceConfig,
    RebalanceService, StaticStakeOracle,
};
use shared_types::{AssetId, Metric, Observation, Timestamp};

pub type MemoryService = RebalanceService<
    InMemoryObservationSource,
    StaticStakeOracle,
    InMemoryStateStore,
    InMemoryAuditLog,
    ManualClock,
>;

/// Reporter set used by every scenario, with oracle stake.
pub const STAKES: [(&str, f64); 3] = [("alpha", 100.0), ("beta", 50.0), ("gamma", 5.0)];

pub fn anchor() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// One hour into day `day`; also epoch `day` under `daily_config`.
pub fn at_day(day: i64) -> Timestamp {
    anchor() + Duration::days(day) + Duration::hours(1)
}

/// Daily epochs and rebalances, three-day eligibility, two constituents.
pub fn daily_config() -> RebalanceConfig {
    let mut config = RebalanceConfig::default();
    config.epoch.anchor = anchor();
    config.epoch.epoch_length_secs = 86_400;
    config.epoch.epochs_per_rebalance = 1;
    config.eligibility.required_days = 3;
    config.selection.n = 2;
    config
}

pub fn memory_service(config: RebalanceConfig) -> MemoryService {
    RebalanceService::new(
        config,
        InMemoryObservationSource::new(),
        StaticStakeOracle::new(STAKES),
        InMemoryStateStore::new(),
        InMemoryAuditLog::new(),
        ManualClock::new(anchor()),
    )
    .unwrap()
}

/// Emission reports from every staked reporter for each day in `days`:
/// one at noon, and one ten minutes before `at_day(day)` so the live
/// window of that day's epoch sees it.
pub fn emissions(days: std::ops::Range<i64>, asset_id: AssetId, value: f64) -> Vec<Observation> {
    let mut out = Vec::new();
    for day in days {
        for (reporter, _) in STAKES {
            let noon = anchor() + Duration::days(day) + Duration::hours(12);
            out.push(Observation::new(reporter, asset_id, Metric::Emission, value, 0.0, noon));
            out.push(Observation::new(
                reporter,
                asset_id,
                Metric::Emission,
                value,
                0.0,
                at_day(day) - Duration::minutes(10),
            ));
        }
    }
    out
}

/// Live price reports five minutes before `at`.
pub fn prices(at: Timestamp, asset_id: AssetId, reports: &[(&str, f64)]) -> Vec<Observation> {
    reports
        .iter()
        .map(|(reporter, value)| {
            Observation::new(*reporter, asset_id, Metric::Price, *value, 0.0, at - Duration::minutes(5))
        })
        .collect()
}

/// Number of audit entries of the given kind.
pub fn audit_count(entries: &[qi_05_rebalance::AuditEntry], kind: &str) -> usize {
    entries.iter().filter(|entry| entry.record.kind() == kind).count()
}
