//! Repository for the `action_logs` table (append-only).

use adpilot_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::action_log::{ActionLog, ActionLogQuery, CreateActionLog};

/// Column list for `action_logs` queries.
const COLUMNS: &str = "\
    id, recommendation_id, account_id, entity_type, entity_id, entity_name, \
    action_type, action_payload, mode, triggered_by, dry_run, status, message, \
    meta_response, created_at";

/// Maximum page size for action log listing.
const MAX_LIMIT: i64 = 500;

/// Default page size for action log listing.
const DEFAULT_LIMIT: i64 = 100;

/// Provides insert and query operations for action logs. No updates.
pub struct ActionLogRepo;

impl ActionLogRepo {
    /// Append a new action log entry.
    pub async fn insert(pool: &PgPool, input: &CreateActionLog) -> Result<ActionLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO action_logs \
                (recommendation_id, account_id, entity_type, entity_id, entity_name, \
                 action_type, action_payload, mode, triggered_by, dry_run, status, message, \
                 meta_response) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ActionLog>(&query)
            .bind(input.recommendation_id)
            .bind(&input.account_id)
            .bind(&input.entity_type)
            .bind(&input.entity_id)
            .bind(&input.entity_name)
            .bind(&input.action_type)
            .bind(&input.action_payload)
            .bind(&input.mode)
            .bind(&input.triggered_by)
            .bind(input.dry_run)
            .bind(&input.status)
            .bind(&input.message)
            .bind(&input.meta_response)
            .fetch_one(pool)
            .await
    }

    /// Entries for one entity created at or after `since`, newest first.
    ///
    /// Feeds the cooldown and daily-cap guardrails.
    pub async fn list_for_entity_since(
        pool: &PgPool,
        account_id: &str,
        entity_type: &str,
        entity_id: &str,
        since: Timestamp,
    ) -> Result<Vec<ActionLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM action_logs \
             WHERE account_id = $1 AND entity_type = $2 AND entity_id = $3 \
               AND created_at >= $4 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ActionLog>(&query)
            .bind(account_id)
            .bind(entity_type)
            .bind(entity_id)
            .bind(since)
            .fetch_all(pool)
            .await
    }

    /// List an account's action logs with optional filters, newest first.
    pub async fn list(
        pool: &PgPool,
        account_id: &str,
        params: &ActionLogQuery,
    ) -> Result<Vec<ActionLog>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);

        let query = format!(
            "SELECT {COLUMNS} FROM action_logs \
             WHERE account_id = $1 \
               AND ($2::BIGINT IS NULL OR recommendation_id = $2) \
               AND ($3::TEXT IS NULL OR entity_id = $3) \
               AND ($4::TEXT IS NULL OR status = $4) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, ActionLog>(&query)
            .bind(account_id)
            .bind(params.recommendation_id)
            .bind(&params.entity_id)
            .bind(&params.status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
