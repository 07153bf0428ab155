//! Repository for the `scheduler_run_logs` table.

use adpilot_core::types::DbId;
use sqlx::PgPool;

use crate::models::scheduler_run_log::SchedulerRunLog;

/// Column list for `scheduler_run_logs` queries.
const COLUMNS: &str = "\
    id, account_id, trigger, dry_run, status, summary, started_at, finished_at, created_at";

/// Maximum page size for run log listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for run log listing.
const DEFAULT_LIMIT: i64 = 20;

/// Provides create, finalize and list operations for scheduler run logs.
pub struct SchedulerRunLogRepo;

impl SchedulerRunLogRepo {
    /// Open a run log at the start of a cycle.
    pub async fn create(
        pool: &PgPool,
        account_id: &str,
        trigger: &str,
        dry_run: bool,
        status: &str,
    ) -> Result<SchedulerRunLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO scheduler_run_logs (account_id, trigger, dry_run, status) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SchedulerRunLog>(&query)
            .bind(account_id)
            .bind(trigger)
            .bind(dry_run)
            .bind(status)
            .fetch_one(pool)
            .await
    }

    /// Close a run log with its final status and summary.
    pub async fn finish(
        pool: &PgPool,
        id: DbId,
        status: &str,
        summary: &serde_json::Value,
    ) -> Result<Option<SchedulerRunLog>, sqlx::Error> {
        let query = format!(
            "UPDATE scheduler_run_logs \
             SET status = $2, summary = $3, finished_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SchedulerRunLog>(&query)
            .bind(id)
            .bind(status)
            .bind(summary)
            .fetch_optional(pool)
            .await
    }

    /// Most recent runs for an account.
    pub async fn list_by_account(
        pool: &PgPool,
        account_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<SchedulerRunLog>, sqlx::Error> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let query = format!(
            "SELECT {COLUMNS} FROM scheduler_run_logs \
             WHERE account_id = $1 \
             ORDER BY started_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, SchedulerRunLog>(&query)
            .bind(account_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
