//! Repository for the `automation_settings` table.

use adpilot_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::automation_settings::{AutomationSettings, UpsertAutomationSettings};

/// Column list for `automation_settings` queries.
const COLUMNS: &str = "\
    account_id, mode, dry_run, scheduler_enabled, auto_generate_recommendations, \
    auto_approve_low_risk, allowed_auto_approve_rule_keys, protected_campaign_ids, \
    action_cooldown_minutes, max_actions_per_entity_per_day, max_applies_per_run, \
    last_scheduler_run_at, last_scheduler_run_status, last_scheduler_run_summary, \
    created_at, updated_at";

/// Provides read, upsert and last-run bookkeeping for automation settings.
pub struct AutomationSettingsRepo;

impl AutomationSettingsRepo {
    /// Find the settings row for an account.
    pub async fn find(
        pool: &PgPool,
        account_id: &str,
    ) -> Result<Option<AutomationSettings>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM automation_settings WHERE account_id = $1");
        sqlx::query_as::<_, AutomationSettings>(&query)
            .bind(account_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or update an account's settings.
    ///
    /// `None` fields keep the stored value, or the column default when the
    /// row is created.
    pub async fn upsert(
        pool: &PgPool,
        account_id: &str,
        dto: &UpsertAutomationSettings,
    ) -> Result<AutomationSettings, sqlx::Error> {
        sqlx::query(
            "INSERT INTO automation_settings (account_id) VALUES ($1) \
             ON CONFLICT (account_id) DO NOTHING",
        )
        .bind(account_id)
        .execute(pool)
        .await?;

        let query = format!(
            "UPDATE automation_settings SET \
                mode = COALESCE($2, mode), \
                dry_run = COALESCE($3, dry_run), \
                scheduler_enabled = COALESCE($4, scheduler_enabled), \
                auto_generate_recommendations = COALESCE($5, auto_generate_recommendations), \
                auto_approve_low_risk = COALESCE($6, auto_approve_low_risk), \
                allowed_auto_approve_rule_keys = COALESCE($7, allowed_auto_approve_rule_keys), \
                protected_campaign_ids = COALESCE($8, protected_campaign_ids), \
                action_cooldown_minutes = COALESCE($9, action_cooldown_minutes), \
                max_actions_per_entity_per_day = COALESCE($10, max_actions_per_entity_per_day), \
                max_applies_per_run = COALESCE($11, max_applies_per_run), \
                updated_at = NOW() \
             WHERE account_id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AutomationSettings>(&query)
            .bind(account_id)
            .bind(&dto.mode)
            .bind(dto.dry_run)
            .bind(dto.scheduler_enabled)
            .bind(dto.auto_generate_recommendations)
            .bind(dto.auto_approve_low_risk)
            .bind(&dto.allowed_auto_approve_rule_keys)
            .bind(&dto.protected_campaign_ids)
            .bind(dto.action_cooldown_minutes)
            .bind(dto.max_actions_per_entity_per_day)
            .bind(dto.max_applies_per_run)
            .fetch_one(pool)
            .await
    }

    /// Account ids whose scheduler switch is on.
    pub async fn list_scheduler_enabled_accounts(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT account_id FROM automation_settings \
             WHERE scheduler_enabled = TRUE \
             ORDER BY account_id",
        )
        .fetch_all(pool)
        .await
    }

    /// Copy the outcome of the latest cycle onto the settings row.
    pub async fn record_last_run(
        pool: &PgPool,
        account_id: &str,
        at: Timestamp,
        status: &str,
        summary: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE automation_settings \
             SET last_scheduler_run_at = $2, last_scheduler_run_status = $3, \
                 last_scheduler_run_summary = $4 \
             WHERE account_id = $1",
        )
        .bind(account_id)
        .bind(at)
        .bind(status)
        .bind(summary)
        .execute(pool)
        .await?;
        Ok(())
    }
}
