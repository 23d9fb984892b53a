//! Domain module for the reputation ledger.

pub mod entry;
pub mod errors;
pub mod ledger;

pub use entry::*;
pub use errors::*;
pub use ledger::*;
