//! Recommendation entity models and DTOs.

use adpilot_core::error::CoreError;
use adpilot_core::evidence::build_evidence_message;
use adpilot_core::recommendation::{ActionType, EntityRef, RecommendationStatus};
use adpilot_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `recommendations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Recommendation {
    pub id: DbId,
    pub account_id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub entity_name: Option<String>,
    /// Parent campaign for ad sets and ads.
    pub campaign_id: Option<String>,
    pub action_type: String,
    pub action_payload: serde_json::Value,
    pub rule_key: String,
    pub severity: String,
    pub confidence: Option<f64>,
    pub evidence: serde_json::Value,
    pub status: String,
    pub approved_at: Option<Timestamp>,
    pub applied_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Recommendation {
    /// Typed reference to the targeted entity.
    pub fn entity_ref(&self) -> Result<EntityRef, CoreError> {
        EntityRef::from_parts(
            &self.entity_type,
            &self.entity_id,
            self.campaign_id.as_deref(),
        )
    }

    /// Parsed action, `None` for unknown literals.
    pub fn action(&self) -> Option<ActionType> {
        ActionType::parse(&self.action_type)
    }

    /// Parsed lifecycle status, `None` for unknown literals.
    pub fn lifecycle_status(&self) -> Option<RecommendationStatus> {
        RecommendationStatus::parse(&self.status)
    }

    /// Whether the action is one of the four executable kinds.
    pub fn is_executable(&self) -> bool {
        self.action().is_some_and(ActionType::is_executable)
    }

    /// Evidence digest for audit messages.
    pub fn evidence_digest(&self) -> String {
        build_evidence_message(&self.evidence, &self.rule_key, &self.severity, self.confidence)
    }
}

/// DTO for inserting a recommendation (used by the generator and fixtures).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecommendation {
    pub account_id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub entity_name: Option<String>,
    pub campaign_id: Option<String>,
    pub action_type: String,
    #[serde(default)]
    pub action_payload: Option<serde_json::Value>,
    pub rule_key: String,
    pub severity: Option<String>,
    pub confidence: Option<f64>,
    #[serde(default)]
    pub evidence: Option<serde_json::Value>,
    /// Initial status; defaults to `queued`.
    pub status: Option<String>,
}

/// Query parameters for `GET /accounts/{account_id}/recommendations`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendationListQuery {
    /// Filter by status literal (e.g. `queued`).
    pub status: Option<String>,
    /// Maximum number of results. Defaults to 50, capped at 200.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
