//! Scheduler run log entity model.

use adpilot_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One scheduler cycle invocation.
///
/// Created eagerly at the start of the cycle with status `success` and
/// finalized (status, summary, `finished_at`) when the cycle ends.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SchedulerRunLog {
    pub id: DbId,
    pub account_id: String,
    pub trigger: String,
    pub dry_run: bool,
    pub status: String,
    pub summary: serde_json::Value,
    pub started_at: Timestamp,
    pub finished_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Query parameters for `GET /accounts/{account_id}/scheduler/runs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunLogQuery {
    /// Maximum number of results. Defaults to 20, capped at 100.
    pub limit: Option<i64>,
}
