//! Handlers for the scheduler trigger and run history.

use adpilot_core::audit::RunTrigger;
use adpilot_db::models::scheduler_run_log::{RunLogQuery, SchedulerRunLog};
use adpilot_engine::CycleReport;
use axum::extract::{Path, Query, State};
use axum::Json;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /accounts/{account_id}/scheduler/run
///
/// Run one cycle now. The cycle never errors: failures are reported in the
/// returned run status and summary.
pub async fn run_cycle(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> AppResult<Json<DataResponse<CycleReport>>> {
    let report = state
        .automation
        .run_scheduler_cycle(&account_id, RunTrigger::Manual)
        .await;
    Ok(Json(DataResponse { data: report }))
}

/// GET /accounts/{account_id}/scheduler/runs
pub async fn list_runs(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(query): Query<RunLogQuery>,
) -> AppResult<Json<DataResponse<Vec<SchedulerRunLog>>>> {
    let runs = state.store().list_run_logs(&account_id, query.limit).await?;
    Ok(Json(DataResponse { data: runs }))
}
