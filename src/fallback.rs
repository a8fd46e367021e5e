//! Fallback ledger - durable log of deferred withdrawals
//!
//! When the balance store is unreachable at admission, withdrawal intents
//! are appended here instead of being queued. The file is the only record
//! of those intents, so every append is synced to disk before returning.
//!
//! # Format
//!
//! One CSV line per record: `time,account_id,amount` (time in seconds since
//! epoch). Append-only; the core never truncates, compacts, or reads it
//! back - replay is external reconciliation work.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::core_types::{AccountId, EpochSeconds};

/// Default ledger file name; fixed so operators know where to look after an
/// outage.
pub const DEFAULT_LEDGER_PATH: &str = "deferred_withdrawals.csv";

/// The ledger write itself failed. This can only happen while the primary
/// store is already down, so it is the most severe failure in the system.
#[derive(Debug, Error)]
#[error("fallback ledger write failed: {0}")]
pub struct FallbackError(#[from] pub io::Error);

/// One deferred withdrawal intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackRecord {
    pub time: EpochSeconds,
    pub account_id: AccountId,
    pub amount: Decimal,
}

impl FallbackRecord {
    /// Stamp a record with the current wall-clock time.
    pub fn now(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            time: Utc::now().timestamp(),
            account_id,
            amount,
        }
    }

    fn to_csv_line(&self) -> String {
        format!("{},{},{}\n", self.time, self.account_id, self.amount)
    }
}

/// Append-only writer for the fallback ledger.
///
/// # Thread safety
/// Not internally synchronized; callers hold it behind a mutex so the file
/// never sees interleaved writers.
pub struct FallbackLedger {
    file: File,
    path: PathBuf,
}

impl FallbackLedger {
    /// Open (or create) the ledger at `path` in append mode.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self { file, path })
    }

    /// Append one record and sync it to disk.
    ///
    /// A successful return means the record survives a process crash
    /// immediately afterwards. No buffering: deferred withdrawals are rare
    /// and each one must be durable on its own.
    pub fn append(&mut self, record: &FallbackRecord) -> Result<(), FallbackError> {
        let line = record.to_csv_line();
        self.file.write_all(line.as_bytes())?;
        self.file.sync_data()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_append_writes_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_LEDGER_PATH);

        let mut ledger = FallbackLedger::open(&path).unwrap();
        ledger
            .append(&FallbackRecord {
                time: 1_700_000_000,
                account_id: 7,
                amount: dec!(25.50),
            })
            .unwrap();
        ledger
            .append(&FallbackRecord {
                time: 1_700_000_001,
                account_id: 8,
                amount: dec!(100.00),
            })
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "1700000000,7,25.50");
        assert_eq!(lines[1], "1700000001,8,100.00");
    }

    #[test]
    fn test_reopen_appends_instead_of_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");

        {
            let mut ledger = FallbackLedger::open(&path).unwrap();
            ledger.append(&FallbackRecord::now(1, dec!(1.00))).unwrap();
        }
        {
            let mut ledger = FallbackLedger::open(&path).unwrap();
            ledger.append(&FallbackRecord::now(2, dec!(2.00))).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/outage/ledger.csv");

        let ledger = FallbackLedger::open(&path).unwrap();
        assert_eq!(ledger.path(), path.as_path());
        assert!(path.parent().unwrap().is_dir());
    }
}
