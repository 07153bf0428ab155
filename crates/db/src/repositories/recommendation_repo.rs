//! Repository for the `recommendations` table.
//!
//! Status transitions are compare-and-set: an update only succeeds when the
//! row still holds the status the caller observed, so two writers can never
//! both move the same recommendation.

use adpilot_core::recommendation::RecommendationStatus;
use adpilot_core::types::DbId;
use sqlx::PgPool;

use crate::models::recommendation::{
    CreateRecommendation, Recommendation, RecommendationListQuery,
};

/// Column list for `recommendations` queries.
const COLUMNS: &str = "\
    id, account_id, entity_type, entity_id, entity_name, campaign_id, \
    action_type, action_payload, rule_key, severity, confidence, evidence, \
    status, approved_at, applied_at, created_at, updated_at";

/// Maximum page size for recommendation listing.
const MAX_LIMIT: i64 = 200;

/// Default page size for recommendation listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides CRUD and state-transition operations for recommendations.
pub struct RecommendationRepo;

impl RecommendationRepo {
    /// Insert a new recommendation.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRecommendation,
    ) -> Result<Recommendation, sqlx::Error> {
        let query = format!(
            "INSERT INTO recommendations \
                (account_id, entity_type, entity_id, entity_name, campaign_id, action_type, \
                 action_payload, rule_key, severity, confidence, evidence, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Recommendation>(&query)
            .bind(&input.account_id)
            .bind(&input.entity_type)
            .bind(&input.entity_id)
            .bind(&input.entity_name)
            .bind(&input.campaign_id)
            .bind(&input.action_type)
            .bind(
                input
                    .action_payload
                    .clone()
                    .unwrap_or_else(|| serde_json::json!({})),
            )
            .bind(&input.rule_key)
            .bind(input.severity.as_deref().unwrap_or("medium"))
            .bind(input.confidence)
            .bind(input.evidence.clone().unwrap_or_else(|| serde_json::json!({})))
            .bind(
                input
                    .status
                    .as_deref()
                    .unwrap_or(RecommendationStatus::Queued.as_str()),
            )
            .fetch_one(pool)
            .await
    }

    /// Find a recommendation by id.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Recommendation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM recommendations WHERE id = $1");
        sqlx::query_as::<_, Recommendation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List an account's recommendations, newest first.
    pub async fn list_by_account(
        pool: &PgPool,
        account_id: &str,
        params: &RecommendationListQuery,
    ) -> Result<Vec<Recommendation>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = params.offset.unwrap_or(0).max(0);

        let query = format!(
            "SELECT {COLUMNS} FROM recommendations \
             WHERE account_id = $1 AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Recommendation>(&query)
            .bind(account_id)
            .bind(&params.status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// List recommendations in one status whose action is in `action_types`,
    /// oldest first. `limit = None` returns every match.
    pub async fn list_by_status_oldest_first(
        pool: &PgPool,
        account_id: &str,
        status: &str,
        action_types: &[String],
        limit: Option<i64>,
    ) -> Result<Vec<Recommendation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM recommendations \
             WHERE account_id = $1 AND status = $2 AND action_type = ANY($3) \
             ORDER BY created_at ASC, id ASC \
             LIMIT $4"
        );
        sqlx::query_as::<_, Recommendation>(&query)
            .bind(account_id)
            .bind(status)
            .bind(action_types)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Move a recommendation from `expected` to `next`.
    ///
    /// Sets `approved_at` when entering `approved` and `applied_at` when
    /// entering `applied`. Returns `false` if the row no longer holds
    /// `expected` (or does not exist).
    pub async fn transition(
        pool: &PgPool,
        id: DbId,
        expected: &str,
        next: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE recommendations \
             SET status = $3, \
                 approved_at = CASE WHEN $3 = 'approved' THEN NOW() ELSE approved_at END, \
                 applied_at = CASE WHEN $3 = 'applied' THEN NOW() ELSE applied_at END, \
                 updated_at = NOW() \
             WHERE id = $1 AND status = $2",
        )
        .bind(id)
        .bind(expected)
        .bind(next)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
