//! Human approve / reject transitions.
//!
//! `approve`: `queued` or `failed` becomes `approved`.
//! `reject`: anything not yet `applied` becomes `false_positive`.
//! Both are compare-and-set, so a row moved by another writer in between
//! is reported as `bad_status` rather than overwritten.

use adpilot_core::recommendation::RecommendationStatus;
use adpilot_core::types::DbId;
use adpilot_db::models::recommendation::Recommendation;
use serde::Serialize;

use crate::automation::Automation;
use crate::error::EngineError;
use crate::pipeline::SkipReason;

/// Result of a human status change.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionOutcome {
    Updated { recommendation: Recommendation },
    Skipped { reason: SkipReason, message: String },
}

impl TransitionOutcome {
    fn skipped(reason: SkipReason, message: impl Into<String>) -> Self {
        Self::Skipped {
            reason,
            message: message.into(),
        }
    }
}

impl Automation {
    pub async fn approve_recommendation(
        &self,
        account_id: &str,
        id: DbId,
    ) -> Result<TransitionOutcome, EngineError> {
        self.human_transition(account_id, id, RecommendationStatus::Approved, |status| {
            matches!(
                status,
                RecommendationStatus::Queued | RecommendationStatus::Failed
            )
        })
        .await
    }

    pub async fn reject_recommendation(
        &self,
        account_id: &str,
        id: DbId,
    ) -> Result<TransitionOutcome, EngineError> {
        self.human_transition(account_id, id, RecommendationStatus::FalsePositive, |status| {
            !matches!(
                status,
                RecommendationStatus::Applied | RecommendationStatus::FalsePositive
            )
        })
        .await
    }

    async fn human_transition(
        &self,
        account_id: &str,
        id: DbId,
        next: RecommendationStatus,
        allowed_from: impl Fn(RecommendationStatus) -> bool,
    ) -> Result<TransitionOutcome, EngineError> {
        let Some(rec) = self.store.get_recommendation(id).await? else {
            return Ok(TransitionOutcome::skipped(
                SkipReason::NotFound,
                format!("Recommendation {id} not found"),
            ));
        };
        if rec.account_id != account_id {
            return Ok(TransitionOutcome::skipped(
                SkipReason::Forbidden,
                format!("Recommendation {id} does not belong to account {account_id}"),
            ));
        }

        let Some(current) = rec.lifecycle_status().filter(|s| allowed_from(*s)) else {
            return Ok(TransitionOutcome::skipped(
                SkipReason::BadStatus,
                format!("Recommendation {id} cannot move from {} to {next}", rec.status),
            ));
        };

        if !self.store.transition_recommendation(id, current, next).await? {
            return Ok(TransitionOutcome::skipped(
                SkipReason::BadStatus,
                format!("Recommendation {id} changed status concurrently"),
            ));
        }

        let Some(recommendation) = self.store.get_recommendation(id).await? else {
            return Ok(TransitionOutcome::skipped(
                SkipReason::NotFound,
                format!("Recommendation {id} not found"),
            ));
        };
        tracing::info!(
            recommendation_id = id,
            account_id,
            from = %current,
            to = %next,
            "Recommendation status changed by user"
        );
        Ok(TransitionOutcome::Updated { recommendation })
    }
}
