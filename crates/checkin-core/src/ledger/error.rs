use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Failed to access ledger file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed ledger file {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode ledger: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Cooldown must not be negative (got {0} hours)")]
    NegativeCooldown(i64),

    #[error("Cooldown of {0} hours is out of range")]
    CooldownOverflow(i64),

    #[error("Check-in not allowed until {next_allowed_at}")]
    CooldownActive { next_allowed_at: i64 },

    #[error("Check-in at {occurred_at} precedes the latest record at {latest}")]
    OutOfOrder { occurred_at: i64, latest: i64 },
}

impl LedgerError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| LedgerError::Io { path, source }
    }
}
