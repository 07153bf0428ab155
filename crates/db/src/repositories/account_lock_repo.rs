//! Per-account advisory lock.
//!
//! Every process that writes for an account (API server, worker) takes the
//! same transaction-scoped advisory lock, so cycles and applies for one
//! account never interleave across processes.

use adpilot_core::settings::ACCOUNT_LOCK_NAMESPACE;
use sqlx::{PgPool, Postgres, Transaction};

/// Acquires the advisory lock that serialises writers for an account.
pub struct AccountLockRepo;

impl AccountLockRepo {
    /// Open a transaction and wait for the account's advisory lock inside it.
    ///
    /// The lock is released when the returned transaction ends, including
    /// when it is dropped without a commit.
    pub async fn acquire(
        pool: &PgPool,
        account_id: &str,
    ) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1, hashtext($2))")
            .bind(ACCOUNT_LOCK_NAMESPACE)
            .bind(account_id)
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }
}
