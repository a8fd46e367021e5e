//! End-to-end pipeline tests against the in-memory balance store.
//!
//! Every scenario goes through the real admission path (`Teller::submit`)
//! and the real processor loops; only the store and the ledger directory
//! are test-local.

use std::sync::Arc;

use rust_decimal_macros::dec;
use tempfile::TempDir;

use teller::command::{AdmissionError, CommandKind, Outcome};
use teller::fallback::FallbackLedger;
use teller::pipeline::{self, Pipeline};
use teller::store::memory::MemoryStore;

struct Harness {
    store: MemoryStore,
    pipeline: Pipeline,
    ledger_dir: TempDir,
}

impl Harness {
    fn start() -> Self {
        let store = MemoryStore::new();
        let ledger_dir = tempfile::tempdir().unwrap();
        let ledger = FallbackLedger::open(ledger_dir.path().join("deferred_withdrawals.csv"))
            .unwrap();
        let pipeline = pipeline::start(Arc::new(store.clone()), ledger, 100);
        Self {
            store,
            pipeline,
            ledger_dir,
        }
    }

    async fn submit(&self, kind: CommandKind, account_id: i64, amount: rust_decimal::Decimal) -> Outcome {
        self.pipeline
            .teller
            .submit(kind, account_id, amount)
            .await
            .expect("admission should succeed")
            .await
            .expect("terminal outcome should arrive")
    }

    fn ledger_lines(&self) -> Vec<String> {
        let path = self.ledger_dir.path().join("deferred_withdrawals.csv");
        std::fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

#[tokio::test]
async fn test_deposit_from_unset_balance_starts_at_zero() {
    let h = Harness::start();
    h.store.insert_account(1, None).await;

    let outcome = h.submit(CommandKind::Deposit, 1, dec!(10.00)).await;
    assert!(matches!(outcome, Outcome::Committed { balance } if balance == dec!(10.00)));
    assert_eq!(h.store.balance(1).await, Some(Some(dec!(10.00))));
}

#[tokio::test]
async fn test_deposits_are_processed_in_admission_order() {
    let h = Harness::start();
    h.store.insert_account(1, None).await;

    // Admit all three before awaiting any outcome; the running balance
    // observed by each command pins the FIFO order.
    let teller = &h.pipeline.teller;
    let mut receivers = Vec::new();
    for amount in [dec!(1.00), dec!(2.00), dec!(3.00)] {
        receivers.push(teller.submit(CommandKind::Deposit, 1, amount).await.unwrap());
    }

    let expected = [dec!(1.00), dec!(3.00), dec!(6.00)];
    for (rx, want) in receivers.into_iter().zip(expected) {
        let outcome = rx.await.unwrap();
        assert!(matches!(outcome, Outcome::Committed { balance } if balance == want));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deposits_all_apply() {
    let h = Harness::start();
    h.store.insert_account(1, None).await;

    let mut handles = Vec::new();
    for _ in 0..25 {
        let teller = h.pipeline.teller.clone();
        handles.push(tokio::spawn(async move {
            teller
                .submit(CommandKind::Deposit, 1, dec!(4.00))
                .await
                .unwrap()
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        assert!(matches!(
            handle.await.unwrap(),
            Outcome::Committed { .. }
        ));
    }

    // N deposits of A from zero: anything below N*A is a lost update.
    assert_eq!(h.store.balance(1).await, Some(Some(dec!(100.00))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deposit_and_withdraw_commute() {
    let h = Harness::start();
    h.store.insert_account(1, Some(dec!(100.00))).await;

    let deposit = {
        let teller = h.pipeline.teller.clone();
        tokio::spawn(async move {
            teller
                .submit(CommandKind::Deposit, 1, dec!(30.00))
                .await
                .unwrap()
                .await
                .unwrap()
        })
    };
    let withdraw = {
        let teller = h.pipeline.teller.clone();
        tokio::spawn(async move {
            teller
                .submit(CommandKind::Withdraw, 1, dec!(50.00))
                .await
                .unwrap()
                .await
                .unwrap()
        })
    };

    assert!(matches!(deposit.await.unwrap(), Outcome::Committed { .. }));
    assert!(matches!(withdraw.await.unwrap(), Outcome::Committed { .. }));
    // Either order lands on 80.00.
    assert_eq!(h.store.balance(1).await, Some(Some(dec!(80.00))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interleaved_commands_conserve_the_signed_sum() {
    let h = Harness::start();
    h.store.insert_account(1, Some(dec!(100.00))).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let teller = h.pipeline.teller.clone();
        handles.push(tokio::spawn(async move {
            teller
                .submit(CommandKind::Deposit, 1, dec!(5.00))
                .await
                .unwrap()
                .await
                .unwrap()
        }));
    }
    // Withdrawals stay within the starting balance, so none can reject.
    for _ in 0..5 {
        let teller = h.pipeline.teller.clone();
        handles.push(tokio::spawn(async move {
            teller
                .submit(CommandKind::Withdraw, 1, dec!(2.00))
                .await
                .unwrap()
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        assert!(matches!(
            handle.await.unwrap(),
            Outcome::Committed { .. }
        ));
    }

    // 100 + 10*5 - 5*2, regardless of interleaving.
    assert_eq!(h.store.balance(1).await, Some(Some(dec!(140.00))));
}

#[tokio::test]
async fn test_overdraft_is_rejected_and_balance_unchanged() {
    let h = Harness::start();
    h.store.insert_account(1, Some(dec!(100.00))).await;

    let outcome = h.submit(CommandKind::Withdraw, 1, dec!(120.00)).await;
    assert!(matches!(outcome, Outcome::InsufficientFunds));
    assert_eq!(h.store.balance(1).await, Some(Some(dec!(100.00))));
}

#[tokio::test]
async fn test_withdraw_with_unset_balance_is_insufficient() {
    let h = Harness::start();
    h.store.insert_account(1, None).await;

    let outcome = h.submit(CommandKind::Withdraw, 1, dec!(0.01)).await;
    assert!(matches!(outcome, Outcome::InsufficientFunds));
    assert_eq!(h.store.balance(1).await, Some(None));
}

#[tokio::test]
async fn test_withdraw_from_missing_account_is_insufficient() {
    let h = Harness::start();

    let outcome = h.submit(CommandKind::Withdraw, 404, dec!(1.00)).await;
    assert!(matches!(outcome, Outcome::InsufficientFunds));
}

#[tokio::test]
async fn test_non_positive_amounts_never_reach_store_or_ledger() {
    let h = Harness::start();
    h.store.insert_account(1, Some(dec!(50.00))).await;

    for (kind, amount) in [
        (CommandKind::Deposit, dec!(0)),
        (CommandKind::Deposit, dec!(-10.00)),
        (CommandKind::Withdraw, dec!(0)),
        (CommandKind::Withdraw, dec!(-0.01)),
    ] {
        let err = h
            .pipeline
            .teller
            .submit(kind, 1, amount)
            .await
            .expect_err("admission must reject");
        assert!(matches!(err, AdmissionError::NonPositiveAmount));
    }

    assert_eq!(h.store.transactions_begun(), 0);
    assert!(h.ledger_lines().is_empty());
}

#[tokio::test]
async fn test_malformed_account_ids_are_rejected_at_admission() {
    let h = Harness::start();

    for account_id in [0, -3] {
        let err = h
            .pipeline
            .teller
            .submit(CommandKind::Deposit, account_id, dec!(1.00))
            .await
            .expect_err("admission must reject");
        assert!(matches!(err, AdmissionError::MalformedAccount));
    }
    assert_eq!(h.store.transactions_begun(), 0);
}

#[tokio::test]
async fn test_store_outage_defers_withdrawal_to_ledger_exactly_once() {
    let h = Harness::start();
    h.store.insert_account(7, Some(dec!(50.00))).await;
    h.store.set_available(false);

    let outcome = h.submit(CommandKind::Withdraw, 7, dec!(20.00)).await;
    assert!(matches!(outcome, Outcome::Deferred));

    let lines = h.ledger_lines();
    assert_eq!(lines.len(), 1, "exactly one fallback record");
    let fields: Vec<&str> = lines[0].split(',').collect();
    assert_eq!(fields.len(), 3);
    assert!(fields[0].parse::<i64>().unwrap() > 0);
    assert_eq!(fields[1], "7");
    assert_eq!(fields[2], "20.00");

    // Never also applied to the store.
    assert_eq!(h.store.transactions_begun(), 0);
    assert_eq!(h.store.balance(7).await, Some(Some(dec!(50.00))));
}

#[tokio::test]
async fn test_store_outage_after_admission_fails_a_deposit() {
    let h = Harness::start();
    h.store.insert_account(1, Some(dec!(10.00))).await;
    h.store.set_available(false);

    // Deposits have no pre-admission probe: the in-loop begin() failure is
    // its own path and reports Failed, not Deferred.
    let outcome = h.submit(CommandKind::Deposit, 1, dec!(5.00)).await;
    assert!(matches!(outcome, Outcome::Failed(_)));
    assert!(h.ledger_lines().is_empty());
    assert_eq!(h.store.balance(1).await, Some(Some(dec!(10.00))));
}

#[tokio::test]
async fn test_failed_commit_does_not_kill_the_worker() {
    let h = Harness::start();
    h.store.insert_account(1, Some(dec!(10.00))).await;

    h.store.set_fail_commits(true);
    let outcome = h.submit(CommandKind::Deposit, 1, dec!(5.00)).await;
    assert!(matches!(outcome, Outcome::Failed(_)));
    assert_eq!(h.store.balance(1).await, Some(Some(dec!(10.00))));

    // The same worker must keep serving subsequent commands.
    h.store.set_fail_commits(false);
    let outcome = h.submit(CommandKind::Deposit, 1, dec!(5.00)).await;
    assert!(matches!(outcome, Outcome::Committed { balance } if balance == dec!(15.00)));
}

#[tokio::test]
async fn test_deposit_to_missing_account_reports_failed() {
    let h = Harness::start();

    // No row to update: surfacing this beats silently committing nothing.
    let outcome = h.submit(CommandKind::Deposit, 404, dec!(5.00)).await;
    assert!(matches!(outcome, Outcome::Failed(_)));
}

#[tokio::test]
async fn test_store_recovery_resumes_normal_withdrawals() {
    let h = Harness::start();
    h.store.insert_account(1, Some(dec!(100.00))).await;

    h.store.set_available(false);
    assert!(matches!(
        h.submit(CommandKind::Withdraw, 1, dec!(10.00)).await,
        Outcome::Deferred
    ));

    h.store.set_available(true);
    let outcome = h.submit(CommandKind::Withdraw, 1, dec!(10.00)).await;
    assert!(matches!(outcome, Outcome::Committed { balance } if balance == dec!(90.00)));

    // The deferral stayed in the ledger; recovery does not replay it.
    assert_eq!(h.ledger_lines().len(), 1);
    assert_eq!(h.store.balance(1).await, Some(Some(dec!(90.00))));
}
