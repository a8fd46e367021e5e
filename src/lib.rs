//! Teller - account balance service
//!
//! Per-account monetary balances with deposits and withdrawals applied
//! through an asynchronous transaction pipeline: bounded intake queues,
//! one single-consumer processing loop per operation kind, a transactional
//! balance store, and a durable fallback ledger for withdrawals admitted
//! while the store is down.
//!
//! # Modules
//!
//! - [`core_types`] - Core type definitions (AccountId, etc.)
//! - [`command`] - Transaction commands, terminal outcomes, admission errors
//! - [`pipeline`] - Queue wiring and the `Teller` admission handle
//! - [`processor`] - The per-kind single-consumer processing loops
//! - [`store`] - Balance store contract, PostgreSQL and in-memory backends
//! - [`fallback`] - Durable append-only ledger for deferred withdrawals
//! - [`account`] - Account creation and listing
//! - [`gateway`] - HTTP intake layer (axum)
//! - [`config`] - YAML + environment configuration
//! - [`logging`] - tracing initialization

pub mod account;
pub mod command;
pub mod config;
pub mod core_types;
pub mod fallback;
pub mod gateway;
pub mod logging;
pub mod pipeline;
pub mod processor;
pub mod store;

// Convenient re-exports at crate root
pub use account::{Account, AccountManager};
pub use command::{AdmissionError, Command, CommandKind, Outcome};
pub use core_types::AccountId;
pub use fallback::{FallbackError, FallbackLedger, FallbackRecord};
pub use pipeline::{DEFAULT_QUEUE_CAPACITY, Pipeline, Teller};
pub use store::{BalanceStore, BalanceTxn, StoreError};
