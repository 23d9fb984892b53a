//! # Quorum-Index Benchmarks
//!
//! Criterion workloads per pipeline stage, driven from
//! `benches/pipeline_benchmarks.rs`.

pub mod aggregation;
pub mod index_construction;
