use adpilot_core::audit::ActionLogStatus;
use adpilot_core::error::CoreError;
use adpilot_db::models::action_log::{ActionLog, ActionLogQuery};
use axum::extract::{Path, Query, State};
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /accounts/{account_id}/action-logs
///
/// Newest first, filterable by recommendation, entity and status.
pub async fn list_action_logs(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(query): Query<ActionLogQuery>,
) -> AppResult<Json<DataResponse<Vec<ActionLog>>>> {
    if let Some(status) = query.status.as_deref() {
        if ActionLogStatus::parse(status).is_none() {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Unknown action log status '{status}'"
            ))));
        }
    }
    let logs = state.store().list_action_logs(&account_id, &query).await?;
    Ok(Json(DataResponse { data: logs }))
}
