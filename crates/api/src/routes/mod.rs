pub mod accounts;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /accounts/{account_id}/scheduler/run                       manual cycle (POST)
/// /accounts/{account_id}/scheduler/runs                      run history
/// /accounts/{account_id}/settings                            get, upsert (PUT)
/// /accounts/{account_id}/recommendations                     list
/// /accounts/{account_id}/recommendations/{id}/apply          apply (POST)
/// /accounts/{account_id}/recommendations/{id}/approve        approve (POST)
/// /accounts/{account_id}/recommendations/{id}/reject         mark false positive (POST)
/// /accounts/{account_id}/action-logs                         audit trail
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(accounts::router())
}
