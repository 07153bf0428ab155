//! Handlers for per-account automation settings.

use adpilot_core::audit::AutomationMode;
use adpilot_core::error::CoreError;
use adpilot_db::models::automation_settings::{AutomationSettings, UpsertAutomationSettings};
use axum::extract::{Path, State};
use axum::Json;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /accounts/{account_id}/settings
///
/// `data` is `null` for an account that was never configured; such an
/// account runs with the fail-safe dry-run policy.
pub async fn get_settings(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> AppResult<Json<DataResponse<Option<AutomationSettings>>>> {
    let settings = state.store().get_settings(&account_id).await?;
    Ok(Json(DataResponse { data: settings }))
}

/// PUT /accounts/{account_id}/settings
///
/// Partial upsert: omitted fields keep their stored value.
pub async fn put_settings(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Json(input): Json<UpsertAutomationSettings>,
) -> AppResult<Json<DataResponse<AutomationSettings>>> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    if let Some(mode) = input.mode.as_deref() {
        if AutomationMode::parse(mode).is_none() {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Unknown automation mode '{mode}'"
            ))));
        }
    }

    let settings = state.store().upsert_settings(&account_id, &input).await?;
    tracing::info!(
        account_id = %account_id,
        dry_run = settings.dry_run,
        scheduler_enabled = settings.scheduler_enabled,
        "Automation settings updated"
    );
    Ok(Json(DataResponse { data: settings }))
}
