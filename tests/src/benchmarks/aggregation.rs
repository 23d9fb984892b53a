//! # Aggregation Benchmarks
//!
//! Workloads:
//! - one asset with a growing reporter set, a tenth of them outliers
//! - a full batch across many assets, fanned out by rayon
//! - the daily series behind eligibility

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use qi_01_epoch_clock::EpochSchedule;
use qi_03_aggregation::{
    aggregate, aggregate_batch, daily_consensus_series, AggregationContext, AggregationParams,
};
use rand::Rng;
use shared_types::{Metric, Observation, ReporterId, Timestamp};

fn now() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Price reports for `assets` assets from `reporters` reporters inside the
/// live window; every tenth reporter is an outlier.
pub fn noisy_reports(assets: u32, reporters: usize) -> Vec<Observation> {
    let mut rng = rand::thread_rng();
    let mut out = Vec::with_capacity(assets as usize * reporters);
    for asset_id in 0..assets {
        for r in 0..reporters {
            let base = 100.0 + asset_id as f64;
            let value = if r % 10 == 9 {
                base * rng.gen_range(2.0..5.0)
            } else {
                base * rng.gen_range(0.99..1.01)
            };
            out.push(Observation::new(
                format!("reporter-{r}"),
                asset_id,
                Metric::Price,
                value,
                rng.gen_range(1.0..1_000.0),
                now() - Duration::seconds(rng.gen_range(0..3_000)),
            ));
        }
    }
    out
}

pub fn bench_single_asset(c: &mut Criterion) {
    let mut group = c.benchmark_group("qi-03-aggregate");
    let params = AggregationParams::default();

    for reporters in [10, 100, 1_000] {
        let observations = noisy_reports(1, reporters);
        let total: f64 = observations.iter().map(|o| o.declared_stake).sum();
        let ctx = AggregationContext {
            now: now(),
            total_known_stake: total,
        };
        group.throughput(Throughput::Elements(reporters as u64));
        group.bench_with_input(
            BenchmarkId::new("reporters", reporters),
            &observations,
            |b, observations| {
                b.iter(|| {
                    black_box(aggregate(
                        0,
                        Metric::Price,
                        observations,
                        |_: &ReporterId| 1.0,
                        &params,
                        &ctx,
                    ))
                })
            },
        );
    }
    group.finish();
}

pub fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("qi-03-aggregate-batch");
    let params = AggregationParams::default();

    for assets in [10, 100, 500] {
        let observations = noisy_reports(assets, 50);
        let ctx = AggregationContext {
            now: now(),
            total_known_stake: 50.0 * 1_000.0,
        };
        group.throughput(Throughput::Elements(observations.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("assets", assets),
            &observations,
            |b, observations| {
                b.iter(|| {
                    black_box(aggregate_batch(
                        Metric::Price,
                        observations,
                        |_: &ReporterId| 1.0,
                        &params,
                        &ctx,
                    ))
                })
            },
        );
    }
    group.finish();
}

pub fn bench_daily_series(c: &mut Criterion) {
    let mut group = c.benchmark_group("qi-03-daily-series");
    let anchor = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let schedule = EpochSchedule::new(anchor, 86_400, 7).unwrap();
    let params = AggregationParams::default();

    let mut observations = Vec::new();
    for day in 0..120 {
        for asset_id in 0..20u32 {
            for r in 0..10 {
                observations.push(Observation::new(
                    format!("reporter-{r}"),
                    asset_id,
                    Metric::Emission,
                    50.0 + r as f64,
                    10.0,
                    anchor + Duration::days(day) + Duration::hours(6),
                ));
            }
        }
    }
    let at = anchor + Duration::days(120) + Duration::hours(1);

    group.throughput(Throughput::Elements(observations.len() as u64));
    group.bench_function("90_days_20_assets", |b| {
        b.iter(|| {
            black_box(daily_consensus_series(
                &schedule,
                &observations,
                at,
                90,
                |_: &ReporterId| 1.0,
                &params,
            ))
        })
    });
    group.finish();
}
