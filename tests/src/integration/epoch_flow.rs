//! # Epoch Flow
//!
//! Multi-epoch runs through `RebalanceService`:
//!
//! 1. **Aggregation → Reputation**: outlier reports cost score and strikes
//! 2. **Reputation → Aggregation**: suspended reporters stop counting
//! 3. **Eligibility → Hysteresis → Canonicalizer**: constituents change only
//!    when a challenger clears the margin

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::*;
    use qi_03_aggregation::ConsensusSource;
    use qi_05_rebalance::{RebalanceApi, RebalanceFailure};
    use shared_types::{Metric, ReporterId};
    use std::collections::{BTreeMap, BTreeSet};

    // =============================================================================
    // AGGREGATION → REPUTATION
    // =============================================================================

    #[tokio::test]
    async fn test_outlier_scenario_from_three_reporters() {
        let svc = memory_service(daily_config());
        let now = at_day(3);
        svc.clock().set(now);
        svc.source().extend(emissions(0..4, 1, 300.0));
        svc.source().extend(emissions(0..4, 2, 100.0));
        svc.source().extend(prices(
            now,
            7,
            &[("alpha", 10.0), ("beta", 10.1), ("gamma", 25.0)],
        ));

        svc.run_epoch(now).await.unwrap();

        let price = svc.consensus_value(7, Metric::Price).unwrap();
        assert_eq!(price.source, ConsensusSource::Window);
        assert_eq!(price.value, 10.0);
        assert!((price.quorum_coverage - 150.0 / 155.0).abs() < 1e-9);
        assert_eq!(price.staleness_seconds, 300);

        let gamma = svc.reporter_status(&ReporterId::new("gamma")).await.unwrap();
        assert!((gamma.score - 0.8).abs() < 1e-9);
        assert_eq!(gamma.strikes, 1);
        assert!(!gamma.suspended);
    }

    #[tokio::test]
    async fn test_silent_reporter_lowers_coverage() {
        let svc = memory_service(daily_config());
        svc.oracle().set("delta", 45.0);
        let now = at_day(3);
        svc.source().extend(emissions(0..4, 1, 300.0));
        svc.source().extend(emissions(0..4, 2, 100.0));
        svc.source().extend(prices(
            now,
            7,
            &[("alpha", 10.0), ("beta", 10.1), ("gamma", 25.0)],
        ));

        svc.run_epoch(now).await.unwrap();

        let price = svc.consensus_value(7, Metric::Price).unwrap();
        assert!((price.quorum_coverage - 0.75).abs() < 1e-9);
    }

    // =============================================================================
    // REPUTATION → AGGREGATION
    // =============================================================================

    #[tokio::test]
    async fn test_repeat_offender_is_suspended_then_ignored() {
        let mut config = daily_config();
        config.reputation.suspension_secs = 3 * 86_400;
        let svc = memory_service(config);
        svc.source().extend(emissions(0..7, 1, 300.0));
        svc.source().extend(emissions(0..7, 2, 100.0));
        for day in 3..7 {
            svc.source().extend(prices(
                at_day(day),
                7,
                &[("alpha", 10.0), ("beta", 10.1), ("gamma", 25.0)],
            ));
        }

        for day in 3..6 {
            svc.run_epoch(at_day(day)).await.unwrap();
        }
        svc.clock().set(at_day(5));
        let gamma = svc.reporter_status(&ReporterId::new("gamma")).await.unwrap();
        assert!(gamma.suspended);
        assert_eq!(gamma.strikes, 3);

        let audit_before = svc.audit_log().entries();
        svc.run_epoch(at_day(6)).await.unwrap();
        let audit_after = svc.audit_log().entries();

        // No new offense: gamma's reports never reach the aggregator.
        assert_eq!(
            audit_count(&audit_after, "offense"),
            audit_count(&audit_before, "offense")
        );
        let price = svc.consensus_value(7, Metric::Price).unwrap();
        assert_eq!(price.quorum_coverage, 1.0);
    }

    #[tokio::test]
    async fn test_reinstated_reporter_rejoins_at_half_weight() {
        let svc = memory_service(daily_config());
        svc.source().extend(emissions(0..5, 1, 300.0));
        svc.source().extend(emissions(0..5, 2, 100.0));
        for day in 3..5 {
            svc.source().extend(prices(
                at_day(day),
                7,
                &[("alpha", 10.0), ("beta", 10.0), ("gamma", 10.0)],
            ));
        }
        svc.run_epoch(at_day(3)).await.unwrap();

        svc.clock().set(at_day(4) - chrono::Duration::minutes(30));
        svc.reinstate_reporter(&ReporterId::new("gamma")).await.unwrap();
        svc.run_epoch(at_day(4)).await.unwrap();

        // alpha 100 + beta 50 + gamma 5 * (0.5 + 0.5 * healed score)
        let price = svc.consensus_value(7, Metric::Price).unwrap();
        assert!(price.quorum_coverage < 1.0);
        assert!(price.quorum_coverage > 152.5 / 155.0);
    }

    // =============================================================================
    // ELIGIBILITY → HYSTERESIS → CANONICALIZER
    // =============================================================================

    #[tokio::test]
    async fn test_constituents_change_only_beyond_margin() {
        let svc = memory_service(daily_config());
        svc.source().extend(emissions(0..6, 1, 300.0));
        svc.source().extend(emissions(0..6, 2, 100.0));
        // Asset 3 starts a day late and is eligible from day 4.
        svc.source().extend(emissions(1..5, 3, 105.0));
        svc.source().extend(emissions(5..6, 3, 200.0));

        let day3 = svc.run_epoch(at_day(3)).await.unwrap();
        assert_eq!(day3.weights_bps, BTreeMap::from([(1, 7_500), (2, 2_500)]));

        // 105 does not clear 100 * 1.10, so the incumbent keeps its seat.
        let day4 = svc.run_epoch(at_day(4)).await.unwrap();
        assert_eq!(day4.constituents().collect::<BTreeSet<_>>(), BTreeSet::from([1, 2]));

        // 200 does.
        let day5 = svc.run_epoch(at_day(5)).await.unwrap();
        assert_eq!(day5.weights_bps, BTreeMap::from([(1, 6_000), (3, 4_000)]));
        assert!(!day5.frozen);
    }

    #[tokio::test]
    async fn test_eligibility_override_excludes_asset() {
        let mut config = daily_config();
        config.eligibility.overrides.insert(1, false);
        let svc = memory_service(config);
        svc.source().extend(emissions(0..4, 1, 300.0));
        svc.source().extend(emissions(0..4, 2, 100.0));
        svc.source().extend(emissions(0..4, 3, 50.0));

        let set = svc.run_epoch(at_day(3)).await.unwrap();
        assert_eq!(set.weights_bps, BTreeMap::from([(2, 6_667), (3, 3_333)]));
    }

    #[tokio::test]
    async fn test_cold_start_without_eligible_assets_fails() {
        let svc = memory_service(daily_config());
        svc.source().extend(emissions(2..4, 1, 300.0));
        svc.source().extend(emissions(2..4, 2, 100.0));

        let err = svc.run_epoch(at_day(3)).await.unwrap_err();
        assert!(matches!(err, RebalanceFailure::NoPriorSnapshot { epoch_id: 3 }));
    }
}
