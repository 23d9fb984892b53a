//! # Ports
//!
//! Outbound dependency of every time-aware subsystem.

use shared_types::Timestamp;

/// Wall-clock UTC instant provider.
///
/// Injected so epoch runs can be replayed deterministically in tests.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Timestamp;
}
