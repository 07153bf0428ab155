//! Route definitions for per-account automation endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{action_logs, recommendations, scheduler, settings};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/accounts/{account_id}/scheduler/run",
            post(scheduler::run_cycle),
        )
        .route(
            "/accounts/{account_id}/scheduler/runs",
            get(scheduler::list_runs),
        )
        .route(
            "/accounts/{account_id}/settings",
            get(settings::get_settings).put(settings::put_settings),
        )
        .route(
            "/accounts/{account_id}/recommendations",
            get(recommendations::list_recommendations),
        )
        .route(
            "/accounts/{account_id}/recommendations/{id}/apply",
            post(recommendations::apply_recommendation),
        )
        .route(
            "/accounts/{account_id}/recommendations/{id}/approve",
            post(recommendations::approve_recommendation),
        )
        .route(
            "/accounts/{account_id}/recommendations/{id}/reject",
            post(recommendations::reject_recommendation),
        )
        .route(
            "/accounts/{account_id}/action-logs",
            get(action_logs::list_action_logs),
        )
}
