//! Balance store - the persistent system of record for account balances
//!
//! The core only depends on the [`BalanceStore`] / [`BalanceTxn`] contract;
//! [`postgres`] is the production implementation and [`memory`] an
//! in-process one used by the pipeline tests.
//!
//! # Isolation requirement
//!
//! `read_balance` + `write_balance` + `commit` inside one transaction MUST
//! be atomic per account with respect to any concurrent transaction: two
//! transactions on the same account can never both read the same stale
//! balance and both commit a write derived from it. This is the load-bearing
//! correctness requirement - the deposit and withdraw loops are each
//! single-threaded, but they still race each other on the same account.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::core_types::AccountId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("balance store unavailable: {0}")]
    Unavailable(String),

    #[error("account {0} does not exist")]
    UnknownAccount(AccountId),
}

/// Handle to the balance store; `begin` opens a transaction, `ping` is the
/// liveness probe used before withdrawal admission.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn BalanceTxn>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// One open store transaction.
///
/// `commit` and `rollback` consume the transaction; a dropped transaction
/// behaves like a rollback.
#[async_trait]
pub trait BalanceTxn: Send {
    /// Current balance for the account. `None` means no account row or a
    /// balance that has never been set - callers decide what that means
    /// (zero for deposits, insufficient for withdrawals).
    async fn read_balance(&mut self, account_id: AccountId) -> Result<Option<Decimal>, StoreError>;

    async fn write_balance(
        &mut self,
        account_id: AccountId,
        value: Decimal,
    ) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>);
}
