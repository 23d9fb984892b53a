//! Adapters for the rebalance orchestrator's outbound ports
//!
//! - `memory`: in-process store, audit log, observation source and oracle
//! - `file_store`: JSON document store with locked read-modify-write
//! - `audit_log`: JSON Lines audit trail
//! - `lock`: advisory file lock shared by the file-backed adapters

pub mod audit_log;
pub mod file_store;
pub mod lock;
pub mod memory;

pub use audit_log::JsonLinesAuditLog;
pub use file_store::FileStateStore;
pub use lock::FileLock;
pub use memory::{InMemoryAuditLog, InMemoryObservationSource, InMemoryStateStore, StaticStakeOracle};
