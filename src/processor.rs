//! Transaction processors - the single-consumer loops
//!
//! One long-lived task per operation kind drains its queue and applies each
//! command to the balance store. The single consumer is the serialization
//! mechanism for its kind; the store's per-account transaction isolation
//! covers the remaining race between the deposit and withdraw loops.
//!
//! Loop discipline:
//!
//! - Exactly one blocking dequeue per pass - a command is taken once and
//!   never observed by anything else.
//! - Every store failure rolls back, reports `Failed`, and moves on. A bad
//!   command never blocks or kills the queue behind it.
//! - The terminal outcome is sent over the command's reply channel, never
//!   written from this task to any caller-owned response surface.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::mpsc;

use crate::command::{Command, Outcome};
use crate::core_types::AccountId;
use crate::store::BalanceStore;

/// Drain the deposit queue until every sender is gone.
pub async fn run_deposit_processor(
    mut queue: mpsc::Receiver<Command>,
    store: Arc<dyn BalanceStore>,
) {
    while let Some(Command {
        account_id,
        amount,
        reply,
    }) = queue.recv().await
    {
        let outcome = apply_deposit(store.as_ref(), account_id, amount).await;
        if let Outcome::Failed(ref e) = outcome {
            tracing::error!(account_id, %amount, "deposit failed: {e}");
        }
        // The originator may have gone away; the outcome is terminal either way.
        let _ = reply.send(outcome);
    }
    tracing::info!("deposit processor stopped");
}

/// Drain the withdraw queue until every sender is gone.
pub async fn run_withdraw_processor(
    mut queue: mpsc::Receiver<Command>,
    store: Arc<dyn BalanceStore>,
) {
    while let Some(Command {
        account_id,
        amount,
        reply,
    }) = queue.recv().await
    {
        let outcome = apply_withdraw(store.as_ref(), account_id, amount).await;
        if let Outcome::Failed(ref e) = outcome {
            tracing::error!(account_id, %amount, "withdrawal failed: {e}");
        }
        let _ = reply.send(outcome);
    }
    tracing::info!("withdraw processor stopped");
}

/// One deposit: read-modify-write inside a single store transaction.
/// An account with no balance record deposits from zero.
async fn apply_deposit(store: &dyn BalanceStore, account_id: AccountId, amount: Decimal) -> Outcome {
    let mut txn = match store.begin().await {
        Ok(txn) => txn,
        Err(e) => return Outcome::Failed(e),
    };

    let current = match txn.read_balance(account_id).await {
        Ok(balance) => balance.unwrap_or(Decimal::ZERO),
        Err(e) => {
            txn.rollback().await;
            return Outcome::Failed(e);
        }
    };

    let updated = current + amount;
    if let Err(e) = txn.write_balance(account_id, updated).await {
        txn.rollback().await;
        return Outcome::Failed(e);
    }

    match txn.commit().await {
        Ok(()) => Outcome::Committed { balance: updated },
        Err(e) => Outcome::Failed(e),
    }
}

/// One withdrawal: same transaction shape plus the funds check. A missing
/// balance record or `current < amount` rejects without mutating anything.
async fn apply_withdraw(
    store: &dyn BalanceStore,
    account_id: AccountId,
    amount: Decimal,
) -> Outcome {
    let mut txn = match store.begin().await {
        Ok(txn) => txn,
        Err(e) => return Outcome::Failed(e),
    };

    let current = match txn.read_balance(account_id).await {
        Ok(Some(balance)) => balance,
        Ok(None) => {
            txn.rollback().await;
            return Outcome::InsufficientFunds;
        }
        Err(e) => {
            txn.rollback().await;
            return Outcome::Failed(e);
        }
    };

    if current < amount {
        txn.rollback().await;
        return Outcome::InsufficientFunds;
    }

    let updated = current - amount;
    if let Err(e) = txn.write_balance(account_id, updated).await {
        txn.rollback().await;
        return Outcome::Failed(e);
    }

    match txn.commit().await {
        Ok(()) => Outcome::Committed { balance: updated },
        Err(e) => Outcome::Failed(e),
    }
}
