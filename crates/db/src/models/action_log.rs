//! Action log entity models and DTOs.
//!
//! Action logs are the append-only audit trail of apply attempts. They have
//! no `updated_at` field (immutable records).

use adpilot_core::audit::ActionLogStatus;
use adpilot_core::guardrails::LoggedAction;
use adpilot_core::recommendation::EntityType;
use adpilot_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single action log entry. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActionLog {
    pub id: DbId,
    pub recommendation_id: Option<DbId>,
    pub account_id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub entity_name: Option<String>,
    pub action_type: String,
    pub action_payload: serde_json::Value,
    pub mode: String,
    pub triggered_by: String,
    pub dry_run: bool,
    pub status: String,
    pub message: String,
    /// Raw platform response when the call was not simulated.
    pub meta_response: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

impl ActionLog {
    /// View used by the cooldown and daily-cap guardrails.
    ///
    /// Rows with unknown literals are skipped.
    pub fn as_logged_action(&self) -> Option<LoggedAction> {
        Some(LoggedAction {
            entity_type: EntityType::parse(&self.entity_type)?,
            entity_id: self.entity_id.clone(),
            status: ActionLogStatus::parse(&self.status)?,
            created_at: self.created_at,
        })
    }
}

/// DTO for inserting a new action log entry.
#[derive(Debug, Clone)]
pub struct CreateActionLog {
    pub recommendation_id: Option<DbId>,
    pub account_id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub entity_name: Option<String>,
    pub action_type: String,
    pub action_payload: serde_json::Value,
    pub mode: String,
    pub triggered_by: String,
    pub dry_run: bool,
    pub status: String,
    pub message: String,
    pub meta_response: Option<serde_json::Value>,
}

/// Filter parameters for `GET /accounts/{account_id}/action-logs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionLogQuery {
    pub recommendation_id: Option<DbId>,
    pub entity_id: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
