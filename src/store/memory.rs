//! In-process balance store
//!
//! Implements the store contract over a `HashMap` for the pipeline tests
//! and local experiments. A transaction takes the store-wide lock and holds
//! it until commit/rollback, which is stricter than the per-row isolation
//! the contract asks for but trivially satisfies it.
//!
//! Failure injection mirrors what the Postgres store can do for real:
//! `set_available(false)` makes `begin`/`ping` fail (store outage) and
//! `set_fail_commits(true)` makes every commit fail after the writes were
//! staged (mid-transaction failure, nothing applied).

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{BalanceStore, BalanceTxn, StoreError};
use crate::core_types::AccountId;

type Accounts = HashMap<AccountId, Option<Decimal>>;

#[derive(Clone, Default)]
pub struct MemoryStore {
    // value None = account row exists but balance never set
    accounts: Arc<Mutex<Accounts>>,
    down: Arc<AtomicBool>,
    fail_commits: Arc<AtomicBool>,
    transactions_begun: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account row, optionally with a starting balance.
    pub async fn insert_account(&self, account_id: AccountId, balance: Option<Decimal>) {
        self.accounts.lock().await.insert(account_id, balance);
    }

    /// Committed balance for an account: `None` if the row doesn't exist,
    /// `Some(None)` if the balance was never set.
    pub async fn balance(&self, account_id: AccountId) -> Option<Option<Decimal>> {
        self.accounts.lock().await.get(&account_id).copied()
    }

    /// Simulate the store going down (or coming back).
    pub fn set_available(&self, available: bool) {
        self.down.store(!available, Ordering::SeqCst);
    }

    /// Make subsequent commits fail after writes are staged.
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// How many transactions have been opened, for asserting the store was
    /// never touched.
    pub fn transactions_begun(&self) -> u64 {
        self.transactions_begun.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BalanceStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn BalanceTxn>, StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is down".into()));
        }
        self.transactions_begun.fetch_add(1, Ordering::SeqCst);

        // Holding the owned guard for the transaction's lifetime is the
        // isolation mechanism: no other transaction can even read until
        // this one ends.
        let guard = self.accounts.clone().lock_owned().await;
        Ok(Box::new(MemoryTxn {
            guard,
            staged: Vec::new(),
            fail_commits: self.fail_commits.clone(),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is down".into()));
        }
        Ok(())
    }
}

struct MemoryTxn {
    guard: OwnedMutexGuard<Accounts>,
    staged: Vec<(AccountId, Decimal)>,
    fail_commits: Arc<AtomicBool>,
}

#[async_trait]
impl BalanceTxn for MemoryTxn {
    async fn read_balance(&mut self, account_id: AccountId) -> Result<Option<Decimal>, StoreError> {
        // Reads observe this transaction's own staged writes first.
        if let Some((_, value)) = self
            .staged
            .iter()
            .rev()
            .find(|(id, _)| *id == account_id)
        {
            return Ok(Some(*value));
        }
        Ok(self.guard.get(&account_id).copied().flatten())
    }

    async fn write_balance(
        &mut self,
        account_id: AccountId,
        value: Decimal,
    ) -> Result<(), StoreError> {
        if !self.guard.contains_key(&account_id) {
            return Err(StoreError::UnknownAccount(account_id));
        }
        self.staged.push((account_id, value));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut txn = *self;
        if txn.fail_commits.load(Ordering::SeqCst) {
            // Guard drops without applying the staged writes, so a failed
            // commit leaves no partial mutation behind.
            return Err(StoreError::Unavailable("commit failed".into()));
        }
        for (account_id, value) in txn.staged.drain(..) {
            txn.guard.insert(account_id, Some(value));
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) {
        // Staged writes are discarded with the transaction.
    }
}
