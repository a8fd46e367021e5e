//! Account manager for creating and listing accounts

use sqlx::PgPool;

use super::models::Account;

pub struct AccountManager;

impl AccountManager {
    /// Create an account with no balance; the store assigns the id.
    pub async fn create(pool: &PgPool, name: &str) -> Result<Account, sqlx::Error> {
        let account: Account =
            sqlx::query_as("INSERT INTO accounts (name) VALUES ($1) RETURNING id, name, balance")
                .bind(name)
                .fetch_one(pool)
                .await?;

        tracing::info!(account_id = account.id, name, "account created");
        Ok(account)
    }

    /// All accounts, ordered by id for deterministic listings.
    pub async fn list(pool: &PgPool) -> Result<Vec<Account>, sqlx::Error> {
        let rows: Vec<Account> = sqlx::query_as("SELECT id, name, balance FROM accounts ORDER BY id")
            .fetch_all(pool)
            .await?;

        Ok(rows)
    }
}
