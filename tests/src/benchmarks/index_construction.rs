//! # Index Construction Benchmarks
//!
//! Selection and canonicalization are per-epoch costs; these keep an eye on
//! how they grow with the candidate universe.

use chrono::{TimeZone, Utc};
use criterion::{black_box, BenchmarkId, Criterion};
use qi_04_index_construction::{
    largest_remainder_bps, select_top_n, to_weight_set, RankHistory, SelectionConfig,
};
use rand::Rng;
use shared_types::AssetId;
use std::collections::{BTreeMap, BTreeSet};

fn random_emissions(assets: u32) -> Vec<(AssetId, f64)> {
    let mut rng = rand::thread_rng();
    (0..assets)
        .map(|asset_id| (asset_id, rng.gen_range(1.0..10_000.0)))
        .collect()
}

pub fn bench_largest_remainder(c: &mut Criterion) {
    let mut group = c.benchmark_group("qi-04-largest-remainder");
    for n in [10u32, 50, 250] {
        let weights: BTreeMap<AssetId, f64> = random_emissions(n).into_iter().collect();
        group.bench_with_input(BenchmarkId::new("constituents", n), &weights, |b, weights| {
            b.iter(|| black_box(largest_remainder_bps(weights)))
        });
    }
    group.finish();
}

pub fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("qi-04-select-top-n");
    let config = SelectionConfig::default();

    for universe in [20u32, 200, 2_000] {
        let ranked = random_emissions(universe);
        let incumbents: BTreeSet<AssetId> = (0..config.n as u32).collect();
        let history: RankHistory = ranked.iter().map(|(asset_id, _)| (*asset_id, 1)).collect();
        group.bench_with_input(BenchmarkId::new("universe", universe), &ranked, |b, ranked| {
            b.iter(|| black_box(select_top_n(ranked, &incumbents, &history, &config)))
        });
    }
    group.finish();
}

pub fn bench_weight_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("qi-04-weight-set");
    let as_of = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let raw: BTreeMap<AssetId, f64> = random_emissions(10).into_iter().collect();
    let selection: Vec<AssetId> = raw.keys().copied().collect();

    group.bench_function("seal_10", |b| {
        b.iter(|| black_box(to_weight_set(42, as_of, &selection, &raw, 10, None)))
    });
    group.finish();
}
