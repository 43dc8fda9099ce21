use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{CheckInRecord, Ledger, LedgerError};

/// Ledger file name in the data directory
const LEDGER_FILE: &str = "data.json";

/// Scratch file the ledger is written to before being renamed into place
const LEDGER_TMP_FILE: &str = "data.json.tmp";

/// File-backed ledger for a single owner.
///
/// Every operation re-reads the file, and every append rewrites it in full.
/// All operations hold the same lock, so a check followed by an append can
/// never interleave with another writer in this process.
pub struct LedgerStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LedgerStore {
    /// Open the ledger in `dir`, creating the directory and an empty ledger
    /// for `owner` if they don't exist yet.
    pub fn open(dir: impl AsRef<Path>, owner: &str) -> Result<Self, LedgerError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(LedgerError::io(dir))?;

        let store = Self {
            path: dir.join(LEDGER_FILE),
            lock: Mutex::new(()),
        };

        if store.path.exists() {
            let ledger = store.read()?;
            if ledger.owner != owner {
                warn!(
                    stored = %ledger.owner,
                    configured = %owner,
                    "Ledger belongs to a different username"
                );
            }
            info!(
                path = %store.path.display(),
                records = ledger.records.len(),
                "Ledger loaded"
            );
        } else {
            store.write(&Ledger::new(owner))?;
            info!(path = %store.path.display(), "Created empty ledger");
        }

        Ok(store)
    }

    /// Remove the ledger file and then its directory.
    /// Failures are logged and otherwise ignored.
    pub fn reset(dir: impl AsRef<Path>) {
        let dir = dir.as_ref();
        let path = dir.join(LEDGER_FILE);

        match std::fs::remove_file(&path) {
            Ok(()) => info!(path = %path.display(), "Removed ledger file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove ledger file"),
        }

        match std::fs::remove_dir(dir) {
            Ok(()) => info!(dir = %dir.display(), "Removed data directory"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(dir = %dir.display(), error = %e, "Failed to remove data directory"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the whole ledger.
    pub fn load(&self) -> Result<Ledger, LedgerError> {
        let _guard = self.lock.lock();
        self.read()
    }

    pub fn can_check_in(&self, now: i64) -> Result<bool, LedgerError> {
        Ok(self.load()?.can_check_in(now))
    }

    pub fn history(&self) -> Result<Vec<CheckInRecord>, LedgerError> {
        Ok(self.load()?.records)
    }

    /// Append a check-in at `now` with the given cooldown, without looking
    /// at whether one is currently allowed. See [`Self::try_check_in`].
    pub fn record_check_in(
        &self,
        now: i64,
        cooldown_hours: i64,
    ) -> Result<CheckInRecord, LedgerError> {
        let record = CheckInRecord::new(now, cooldown_hours)?;

        let _guard = self.lock.lock();
        let mut ledger = self.read()?;
        ledger.append(record)?;
        self.write(&ledger)?;

        debug!(
            occurred_at = record.occurred_at,
            next_allowed_at = record.next_allowed_at,
            "Check-in recorded"
        );
        Ok(record)
    }

    /// Check eligibility and append under one lock.
    pub fn try_check_in(
        &self,
        now: i64,
        cooldown_hours: i64,
    ) -> Result<CheckInRecord, LedgerError> {
        let record = CheckInRecord::new(now, cooldown_hours)?;

        let _guard = self.lock.lock();
        let mut ledger = self.read()?;
        if !ledger.can_check_in(now) {
            return Err(LedgerError::CooldownActive {
                next_allowed_at: ledger.next_allowed_at().unwrap_or(now),
            });
        }
        ledger.append(record)?;
        self.write(&ledger)?;

        debug!(
            occurred_at = record.occurred_at,
            next_allowed_at = record.next_allowed_at,
            "Check-in recorded"
        );
        Ok(record)
    }

    fn read(&self) -> Result<Ledger, LedgerError> {
        let contents = std::fs::read_to_string(&self.path).map_err(LedgerError::io(&self.path))?;

        serde_json::from_str(&contents).map_err(|source| LedgerError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        let contents = serde_json::to_string_pretty(ledger).map_err(LedgerError::Encode)?;

        let tmp = self.path.with_file_name(LEDGER_TMP_FILE);
        std::fs::write(&tmp, contents).map_err(LedgerError::io(&tmp))?;
        std::fs::rename(&tmp, &self.path).map_err(LedgerError::io(&self.path))?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, LedgerStore) {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::open(dir.path().join("data"), "operator").unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_creates_empty_ledger() {
        let (dir, store) = open_store();
        assert!(dir.path().join("data").join("data.json").exists());

        let ledger = store.load().unwrap();
        assert_eq!(ledger, Ledger::new("operator"));
        assert!(store.can_check_in(0).unwrap());
    }

    #[test]
    fn test_record_appends_and_persists() {
        let (dir, store) = open_store();

        let first = store.record_check_in(1_000, 24).unwrap();
        assert_eq!(first.next_allowed_at, 1_000 + 86_400);
        assert_eq!(store.history().unwrap().len(), 1);

        let second = store.record_check_in(2_000, 1).unwrap();
        assert_eq!(store.history().unwrap(), vec![first, second]);

        // A fresh store over the same directory sees the same records
        let reopened = LedgerStore::open(dir.path().join("data"), "operator").unwrap();
        assert_eq!(reopened.history().unwrap(), vec![first, second]);
    }

    #[test]
    fn test_record_ignores_cooldown() {
        let (_dir, store) = open_store();
        store.record_check_in(0, 24).unwrap();
        assert!(!store.can_check_in(10).unwrap());

        store.record_check_in(10, 24).unwrap();
        assert_eq!(store.history().unwrap().len(), 2);
    }

    #[test]
    fn test_try_check_in_enforces_cooldown() {
        let (_dir, store) = open_store();
        store.try_check_in(0, 24).unwrap();

        let err = store.try_check_in(86_400, 24).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::CooldownActive {
                next_allowed_at: 86_400
            }
        ));
        assert_eq!(store.history().unwrap().len(), 1);

        let record = store.try_check_in(86_401, 12).unwrap();
        assert_eq!(record.next_allowed_at, 86_401 + 12 * 3600);
        assert_eq!(store.history().unwrap().len(), 2);
    }

    #[test]
    fn test_negative_cooldown_leaves_file_untouched() {
        let (_dir, store) = open_store();
        let before = std::fs::read_to_string(store.path()).unwrap();

        assert!(matches!(
            store.record_check_in(0, -5),
            Err(LedgerError::NegativeCooldown(-5))
        ));
        assert!(matches!(
            store.try_check_in(0, -5),
            Err(LedgerError::NegativeCooldown(-5))
        ));

        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn test_corrupt_file_fails_operation() {
        let (_dir, store) = open_store();
        std::fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(LedgerError::Corrupt { .. })));
        assert!(matches!(
            store.can_check_in(0),
            Err(LedgerError::Corrupt { .. })
        ));
        assert!(matches!(
            store.record_check_in(0, 1),
            Err(LedgerError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_open_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("data.json"), r#"{"timestamps":[]}"#).unwrap();

        let result = LedgerStore::open(dir.path(), "operator");
        assert!(matches!(result, Err(LedgerError::Corrupt { .. })));
    }

    #[test]
    fn test_missing_file_fails_operation() {
        let (_dir, store) = open_store();
        std::fs::remove_file(store.path()).unwrap();

        assert!(matches!(store.history(), Err(LedgerError::Io { .. })));
    }

    #[test]
    fn test_open_keeps_existing_records() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("data.json"),
            r#"{"username":"someone-else","timestamps":[{"current":5,"next":7}]}"#,
        )
        .unwrap();

        let store = LedgerStore::open(dir.path(), "operator").unwrap();
        let ledger = store.load().unwrap();
        assert_eq!(ledger.owner, "someone-else");
        assert_eq!(ledger.records.len(), 1);
    }

    #[test]
    fn test_reset_removes_file_and_directory() {
        let (dir, store) = open_store();
        store.record_check_in(0, 1).unwrap();
        drop(store);

        let data_dir = dir.path().join("data");
        LedgerStore::reset(&data_dir);
        assert!(!data_dir.exists());

        // Nothing left to remove; must not panic
        LedgerStore::reset(&data_dir);

        let store = LedgerStore::open(&data_dir, "operator").unwrap();
        assert!(store.history().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        let (_dir, store) = open_store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..5 {
                        store.record_check_in(100, 0).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.history().unwrap().len(), 40);
    }

    #[test]
    fn test_concurrent_try_check_in_admits_one() {
        let (_dir, store) = open_store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.try_check_in(100, 24).is_ok())
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(admitted, 1);
        assert_eq!(store.history().unwrap().len(), 1);
    }
}
