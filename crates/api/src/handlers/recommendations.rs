//! Handlers for listing recommendations and the human actions on them.

use adpilot_core::error::CoreError;
use adpilot_core::recommendation::RecommendationStatus;
use adpilot_core::types::DbId;
use adpilot_db::models::recommendation::{Recommendation, RecommendationListQuery};
use adpilot_engine::{ApplyOptions, ApplyOutcome, TransitionOutcome};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Optional body for the apply endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ApplyRequest {
    /// Apply a `queued` recommendation without approving it first.
    #[serde(default)]
    pub force_queued: bool,
}

/// GET /accounts/{account_id}/recommendations
pub async fn list_recommendations(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(query): Query<RecommendationListQuery>,
) -> AppResult<Json<DataResponse<Vec<Recommendation>>>> {
    if let Some(status) = query.status.as_deref() {
        if RecommendationStatus::parse(status).is_none() {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Unknown recommendation status '{status}'"
            ))));
        }
    }
    let recs = state.store().list_recommendations(&account_id, &query).await?;
    Ok(Json(DataResponse { data: recs }))
}

/// POST /accounts/{account_id}/recommendations/{id}/apply
///
/// Blocked and failed attempts are normal outcomes (200); refusals before
/// policy evaluation map to 404/403/409/400.
pub async fn apply_recommendation(
    State(state): State<AppState>,
    Path((account_id, id)): Path<(String, DbId)>,
    body: Bytes,
) -> AppResult<Json<DataResponse<ApplyOutcome>>> {
    let request: ApplyRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ApplyRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?
    };

    let outcome = state
        .automation
        .apply_recommendation(&account_id, id, ApplyOptions::user(request.force_queued))
        .await?;

    match outcome {
        ApplyOutcome::Skipped { reason, message } => Err(AppError::skipped(reason, id, message)),
        outcome => Ok(Json(DataResponse { data: outcome })),
    }
}

/// POST /accounts/{account_id}/recommendations/{id}/approve
pub async fn approve_recommendation(
    State(state): State<AppState>,
    Path((account_id, id)): Path<(String, DbId)>,
) -> AppResult<Json<DataResponse<Recommendation>>> {
    let outcome = state.automation.approve_recommendation(&account_id, id).await?;
    transition_response(outcome, id)
}

/// POST /accounts/{account_id}/recommendations/{id}/reject
///
/// Marks the recommendation as a false positive.
pub async fn reject_recommendation(
    State(state): State<AppState>,
    Path((account_id, id)): Path<(String, DbId)>,
) -> AppResult<Json<DataResponse<Recommendation>>> {
    let outcome = state.automation.reject_recommendation(&account_id, id).await?;
    transition_response(outcome, id)
}

fn transition_response(
    outcome: TransitionOutcome,
    id: DbId,
) -> AppResult<Json<DataResponse<Recommendation>>> {
    match outcome {
        TransitionOutcome::Updated { recommendation } => Ok(Json(DataResponse {
            data: recommendation,
        })),
        TransitionOutcome::Skipped { reason, message } => Err(AppError::skipped(reason, id, message)),
    }
}
