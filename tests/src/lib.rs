//! # Quorum-Index Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Criterion workloads per stage
//! │   ├── aggregation.rs
//! │   └── index_construction.rs
//! │
//! └── integration/      # Cross-crate flows through the rebalance service
//!     ├── fixtures.rs
//!     ├── epoch_flow.rs
//!     └── persistence.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p qi-tests
//!
//! # By category
//! cargo test -p qi-tests integration::
//!
//! # Benchmarks
//! cargo bench -p qi-tests
//! ```

pub mod benchmarks;
pub mod integration;
