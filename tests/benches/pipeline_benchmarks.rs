//! # Quorum-Index Pipeline Benchmarks
//!
//! | Stage | Workload |
//! |-------|----------|
//! | qi-03 Aggregation | single asset, batch, 90-day series |
//! | qi-04 Index Construction | bps rounding, selection, sealing |

use criterion::{criterion_group, criterion_main};
use qi_tests::benchmarks::{aggregation, index_construction};

criterion_group!(
    aggregation_benches,
    aggregation::bench_single_asset,
    aggregation::bench_batch,
    aggregation::bench_daily_series
);

criterion_group!(
    index_benches,
    index_construction::bench_largest_remainder,
    index_construction::bench_selection,
    index_construction::bench_weight_set
);

criterion_main!(aggregation_benches, index_benches);
