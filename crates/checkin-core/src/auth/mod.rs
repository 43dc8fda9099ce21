//! Authentication module for the single operator account.
//!
//! This module provides:
//! - `Credentials`: the configured username/password pair
//! - `SessionAuthority`: issues, validates and revokes session tokens
//!
//! Sessions live in memory only; a restart invalidates every token.

pub mod credentials;
pub mod error;
pub mod session;

pub use credentials::Credentials;
pub use error::AuthError;
pub use session::{Session, SessionAuthority, SessionToken, SESSION_TTL_HOURS};
