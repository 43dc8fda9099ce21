//! Check-in ledger module.
//!
//! This module provides the `LedgerStore` for persisting one owner's
//! check-in history as a single JSON file. Each check-in carries the
//! earliest instant at which the next one is allowed; a new check-in is
//! permitted only once the current time is strictly past that instant.
//!
//! The file is rewritten in full on every append.

pub mod error;
pub mod record;
pub mod store;

pub use error::LedgerError;
pub use record::{CheckInRecord, Ledger, SECONDS_PER_HOUR};
pub use store::LedgerStore;
