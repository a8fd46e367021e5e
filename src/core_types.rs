//! Core types used throughout the system
//!
//! Fundamental type aliases shared by all modules. They carry semantic
//! meaning and keep the door open for future type evolution.

/// Account ID - unique identifier for an account.
///
/// # Constraints:
/// - **Store-assigned**: allocated by the balance store (`BIGSERIAL`)
/// - **Positive**: zero and negative values are rejected at admission
/// - **Immutable**: never reused, accounts are never deleted
pub type AccountId = i64;

/// Seconds since the Unix epoch, as written to fallback ledger records.
pub type EpochSeconds = i64;
