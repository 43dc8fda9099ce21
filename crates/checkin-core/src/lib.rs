//! Core library for checkin.
//!
//! - `ledger`: the file-persisted check-in ledger and its cooldown policy
//! - `auth`: the session authority guarding the single operator account

pub mod auth;
pub mod ledger;

pub use auth::{
    AuthError, Credentials, Session, SessionAuthority, SessionToken, SESSION_TTL_HOURS,
};
pub use ledger::{CheckInRecord, Ledger, LedgerError, LedgerStore};
