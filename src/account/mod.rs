//! Account creation and listing
//!
//! Simple create/read against the accounts relation; no concurrency
//! concerns here. Balances are mutated only by the transaction processors.

pub mod manager;
pub mod models;

pub use manager::AccountManager;
pub use models::Account;
