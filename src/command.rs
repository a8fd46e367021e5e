//! Transaction commands and their terminal outcomes
//!
//! A [`Command`] is one deposit or withdraw request flowing through the
//! pipeline. It carries a oneshot reply channel so the terminal outcome is
//! delivered back to whatever issued the request, even though the issuer
//! (an HTTP handler) and the processor live on different tasks.
//!
//! Lifecycle per command:
//!
//! ```text
//! Queued → Processing → { Committed, InsufficientFunds, Failed, Deferred }
//! ```
//!
//! Every command reaches exactly one terminal state, reported exactly once.

use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::core_types::AccountId;
use crate::fallback::FallbackError;
use crate::store::StoreError;

/// Operation kind, one bounded queue and one processor per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Deposit,
    Withdraw,
}

/// One admitted transaction command.
///
/// Consumed exactly once by the processor owning its queue; there is no
/// retry or requeue of the same command instance.
#[derive(Debug)]
pub struct Command {
    pub account_id: AccountId,
    pub amount: Decimal,
    /// Terminal outcome is sent here; the sender is consumed by the send,
    /// which is what makes "exactly once" structural.
    pub reply: oneshot::Sender<Outcome>,
}

/// Terminal outcome of a command.
#[derive(Debug)]
pub enum Outcome {
    /// The store durably applied the mutation. Carries the post-commit
    /// balance.
    Committed { balance: Decimal },
    /// Business rejection: no balance record, or balance < amount.
    /// Nothing was mutated.
    InsufficientFunds,
    /// The store transaction failed; it was rolled back before this was
    /// reported. Not retried by the core.
    Failed(StoreError),
    /// The store was unreachable at admission; the withdrawal intent was
    /// durably appended to the fallback ledger for external reconciliation.
    /// Weaker than `Committed`: funds have not moved.
    Deferred,
    /// The store was unreachable AND the fallback append failed. Surfaced
    /// distinctly so operators know funds tracking may be inconsistent.
    FallbackFailed(FallbackError),
}

impl Outcome {
    /// Short status tag for logs and API responses.
    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Committed { .. } => "COMMITTED",
            Outcome::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Outcome::Failed(_) => "FAILED",
            Outcome::Deferred => "DEFERRED",
            Outcome::FallbackFailed(_) => "FALLBACK_FAILED",
        }
    }
}

/// Rejections raised at admission, before a command is ever queued.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("malformed account id")]
    MalformedAccount,

    #[error("transaction pipeline is shut down")]
    PipelineClosed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_outcome_status_tags() {
        assert_eq!(Outcome::Committed { balance: dec!(1.00) }.status(), "COMMITTED");
        assert_eq!(Outcome::InsufficientFunds.status(), "INSUFFICIENT_FUNDS");
        assert_eq!(Outcome::Deferred.status(), "DEFERRED");
    }

    #[test]
    fn test_reply_is_exactly_once() {
        let (tx, mut rx) = oneshot::channel();
        let cmd = Command {
            account_id: 1,
            amount: dec!(10.00),
            reply: tx,
        };

        cmd.reply.send(Outcome::InsufficientFunds).unwrap();
        assert!(matches!(rx.try_recv(), Ok(Outcome::InsufficientFunds)));
    }
}
