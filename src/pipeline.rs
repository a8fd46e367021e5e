//! Pipeline - queue wiring and command admission
//!
//! ```text
//! ┌──────────────┐   deposit queue    ┌─────────────────────┐
//! │              │ ─────────────────▶ │  Deposit Processor  │──┐
//! │    Teller    │                    └─────────────────────┘  │   ┌─────────────┐
//! │  (admission) │   withdraw queue   ┌─────────────────────┐  ├──▶│ BalanceStore│
//! │              │ ─────────────────▶ │ Withdraw Processor  │──┘   └─────────────┘
//! └──────┬───────┘                    └─────────────────────┘
//!        │ store unreachable at admission (withdrawals)
//!        ▼
//! ┌────────────────┐
//! │ FallbackLedger │
//! └────────────────┘
//! ```
//!
//! # Key design
//!
//! - **Bounded queues**: one `tokio::sync::mpsc` channel per kind.
//!   `send().await` applies backpressure when full; a command is admitted or
//!   the caller waits - it is never dropped.
//! - **Single consumer per kind**: the receivers are moved into the two
//!   processor tasks, so queue discipline itself serializes each kind.
//! - **Decoupled replies**: admission hands back a oneshot receiver; the
//!   processors never touch caller-owned response surfaces.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::command::{AdmissionError, Command, CommandKind, Outcome};
use crate::core_types::AccountId;
use crate::fallback::{FallbackLedger, FallbackRecord};
use crate::processor;
use crate::store::BalanceStore;

/// Default capacity for each transaction queue. Deep enough to absorb a
/// burst, shallow enough that backpressure reaches callers quickly.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// A running pipeline: the admission handle plus the two worker tasks.
pub struct Pipeline {
    pub teller: Teller,
    pub deposit_worker: JoinHandle<()>,
    pub withdraw_worker: JoinHandle<()>,
}

/// Build the queues, spawn one processor per kind, and return the handle
/// callers submit through.
pub fn start(
    store: Arc<dyn BalanceStore>,
    ledger: FallbackLedger,
    queue_capacity: usize,
) -> Pipeline {
    let (deposits, deposit_queue) = mpsc::channel(queue_capacity);
    let (withdrawals, withdraw_queue) = mpsc::channel(queue_capacity);

    let deposit_worker = tokio::spawn(processor::run_deposit_processor(
        deposit_queue,
        store.clone(),
    ));
    let withdraw_worker = tokio::spawn(processor::run_withdraw_processor(
        withdraw_queue,
        store.clone(),
    ));

    Pipeline {
        teller: Teller {
            deposits,
            withdrawals,
            store,
            fallback: Arc::new(Mutex::new(ledger)),
        },
        deposit_worker,
        withdraw_worker,
    }
}

/// Cloneable admission handle. Validates commands, routes them into the
/// matching queue, and diverts withdrawals to the fallback ledger when the
/// store's liveness probe fails.
#[derive(Clone)]
pub struct Teller {
    deposits: mpsc::Sender<Command>,
    withdrawals: mpsc::Sender<Command>,
    store: Arc<dyn BalanceStore>,
    // One writer at a time; admission runs on many caller tasks.
    fallback: Arc<Mutex<FallbackLedger>>,
}

impl Teller {
    /// Submit one command. Returns the receiver for its terminal outcome,
    /// which arrives exactly once; or an [`AdmissionError`] if the command
    /// never entered the pipeline.
    ///
    /// Admission may wait for queue space but never mutates the balance
    /// store itself.
    pub async fn submit(
        &self,
        kind: CommandKind,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<oneshot::Receiver<Outcome>, AdmissionError> {
        if amount <= Decimal::ZERO {
            return Err(AdmissionError::NonPositiveAmount);
        }
        if account_id <= 0 {
            return Err(AdmissionError::MalformedAccount);
        }

        let (reply, outcome) = oneshot::channel();

        // Liveness probe before a withdrawal is queued: a store that is
        // already down turns the command into a durable deferral instead.
        // A store that fails after this point is reported as Failed by the
        // processor - the two paths stay independent.
        if kind == CommandKind::Withdraw && self.store.ping().await.is_err() {
            let record = FallbackRecord::now(account_id, amount);
            let result = self.fallback.lock().await.append(&record);
            let terminal = match result {
                Ok(()) => {
                    tracing::warn!(account_id, %amount, "store down, withdrawal deferred to fallback ledger");
                    Outcome::Deferred
                }
                Err(e) => {
                    tracing::error!(account_id, %amount, "store down AND fallback append failed: {e}");
                    Outcome::FallbackFailed(e)
                }
            };
            let _ = reply.send(terminal);
            return Ok(outcome);
        }

        let queue = match kind {
            CommandKind::Deposit => &self.deposits,
            CommandKind::Withdraw => &self.withdrawals,
        };
        queue
            .send(Command {
                account_id,
                amount,
                reply,
            })
            .await
            .map_err(|_| AdmissionError::PipelineClosed)?;

        Ok(outcome)
    }
}
