//! Data models for account management

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use crate::core_types::AccountId;

/// One account row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    /// NULL until the first deposit commits.
    pub balance: Option<Decimal>,
}
