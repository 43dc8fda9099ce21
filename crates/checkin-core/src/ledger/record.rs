use serde::{Deserialize, Serialize};

use super::LedgerError;

/// Cooldowns are given in hours and stored in seconds.
pub const SECONDS_PER_HOUR: i64 = 60 * 60;

/// One check-in. Timestamps are Unix epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInRecord {
    #[serde(rename = "current")]
    pub occurred_at: i64,
    #[serde(rename = "next")]
    pub next_allowed_at: i64,
}

impl CheckInRecord {
    pub fn new(now: i64, cooldown_hours: i64) -> Result<Self, LedgerError> {
        if cooldown_hours < 0 {
            return Err(LedgerError::NegativeCooldown(cooldown_hours));
        }

        let next_allowed_at = cooldown_hours
            .checked_mul(SECONDS_PER_HOUR)
            .and_then(|secs| now.checked_add(secs))
            .ok_or(LedgerError::CooldownOverflow(cooldown_hours))?;

        Ok(Self {
            occurred_at: now,
            next_allowed_at,
        })
    }

    /// Whether the cooldown started by this record is over at `now`.
    /// The boundary instant itself still counts as inside the cooldown.
    pub fn has_elapsed(&self, now: i64) -> bool {
        now > self.next_allowed_at
    }

    pub fn cooldown_secs(&self) -> i64 {
        self.next_allowed_at - self.occurred_at
    }
}

/// The persisted ledger: its owner and every check-in in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(rename = "username")]
    pub owner: String,
    #[serde(rename = "timestamps", default)]
    pub records: Vec<CheckInRecord>,
}

impl Ledger {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            records: Vec::new(),
        }
    }

    pub fn last(&self) -> Option<&CheckInRecord> {
        self.records.last()
    }

    /// The latest record's `next_allowed_at`; `None` for an empty ledger.
    pub fn next_allowed_at(&self) -> Option<i64> {
        self.last().map(|r| r.next_allowed_at)
    }

    pub fn can_check_in(&self, now: i64) -> bool {
        match self.last() {
            Some(last) => last.has_elapsed(now),
            None => true,
        }
    }

    /// Append a record. Records must not go back in time.
    pub fn append(&mut self, record: CheckInRecord) -> Result<(), LedgerError> {
        if let Some(last) = self.last() {
            if record.occurred_at < last.occurred_at {
                return Err(LedgerError::OutOfOrder {
                    occurred_at: record.occurred_at,
                    latest: last.occurred_at,
                });
            }
        }
        self.records.push(record);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
