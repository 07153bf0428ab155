//! Action executor.
//!
//! Translates one high-level action into a platform write, or simulates it
//! in dry-run. Total: every expected failure comes back as
//! [`ExecutionResult::Failure`], never as an `Err` or a panic.

use std::sync::Arc;

use adpilot_core::budget::{compute_budget_change, percent_from_payload, BudgetChange};
use adpilot_core::recommendation::{ActionType, EntityRef};
use adpilot_meta::{AdPlatform, EntityStatus};
use serde_json::{json, Value};

/// Prefix of every dry-run summary.
pub const DRY_RUN_PREFIX: &str = "[DRY RUN]";

/// Prefix of the canned result used in mock integration mode.
pub const MOCK_PREFIX: &str = "[MOCK]";

/// One action to execute.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionRequest<'a> {
    pub entity: &'a EntityRef,
    pub entity_name: Option<&'a str>,
    pub action: ActionType,
    pub payload: &'a Value,
    pub dry_run: bool,
}

/// Outcome of one executor call.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Success {
        response_summary: String,
        /// Parameters sent (or that would have been sent) to the platform.
        request_payload: Value,
        simulated: bool,
        /// Raw platform response for live writes.
        response: Option<Value>,
    },
    Failure {
        error: String,
    },
}

impl ExecutionResult {
    fn simulated(response_summary: String, request_payload: Value) -> Self {
        Self::Success {
            response_summary,
            request_payload,
            simulated: true,
            response: None,
        }
    }

    fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    /// Canned success returned instead of calling the executor in mock mode.
    pub fn mock(request: &ExecutionRequest<'_>) -> Self {
        Self::simulated(
            format!(
                "{MOCK_PREFIX} Simulated {} on {}",
                request.action,
                describe(request.entity, request.entity_name)
            ),
            json!({}),
        )
    }
}

/// Executes actions against an [`AdPlatform`].
#[derive(Clone)]
pub struct ActionExecutor {
    platform: Arc<dyn AdPlatform>,
}

impl ActionExecutor {
    pub fn new(platform: Arc<dyn AdPlatform>) -> Self {
        Self { platform }
    }

    pub async fn execute(&self, request: ExecutionRequest<'_>) -> ExecutionResult {
        match request.action {
            ActionType::Pause => self.set_status(&request, EntityStatus::Paused).await,
            ActionType::Resume => self.set_status(&request, EntityStatus::Active).await,
            ActionType::IncreaseBudget | ActionType::DecreaseBudget => {
                self.change_budget(&request).await
            }
            other => ExecutionResult::failure(format!("Action {other} is not executable")),
        }
    }

    async fn set_status(&self, request: &ExecutionRequest<'_>, status: EntityStatus) -> ExecutionResult {
        let target = describe(request.entity, request.entity_name);
        let verb = match status {
            EntityStatus::Paused => "pause",
            EntityStatus::Active => "resume",
        };
        let request_payload = json!({ "status": status.as_str() });

        if request.dry_run {
            return ExecutionResult::simulated(
                format!("{DRY_RUN_PREFIX} Would {verb} {target}"),
                request_payload,
            );
        }

        match self.platform.set_status(request.entity.id(), status).await {
            Ok(response) => ExecutionResult::Success {
                response_summary: format!("Set {target} to {}", status.as_str()),
                request_payload,
                simulated: false,
                response: Some(response),
            },
            Err(e) => ExecutionResult::failure(format!("Failed to {verb} {target}: {e}")),
        }
    }

    async fn change_budget(&self, request: &ExecutionRequest<'_>) -> ExecutionResult {
        let target = describe(request.entity, request.entity_name);
        if !request.entity.has_budget() {
            return ExecutionResult::failure(format!(
                "Budget changes are only supported for campaigns and ad sets, not {target}"
            ));
        }

        let budget = match self.platform.get_budget(request.entity.id()).await {
            Ok(budget) => budget,
            Err(e) => {
                return ExecutionResult::failure(format!("Failed to read budget of {target}: {e}"))
            }
        };

        let current = match (budget.daily_budget, budget.lifetime_budget) {
            (Some(daily), _) if daily > 0 => daily,
            (_, Some(lifetime)) if lifetime > 0 => {
                return ExecutionResult::failure(format!(
                    "{target} uses a lifetime budget; only daily budgets can be adjusted"
                ))
            }
            _ => return ExecutionResult::failure(format!("{target} has no valid daily budget")),
        };

        let percent = percent_from_payload(request.action, request.payload);
        let Some(change) = compute_budget_change(request.action, current, percent) else {
            return ExecutionResult::failure(format!("Action {} is not a budget change", request.action));
        };
        let request_payload = json!({ "daily_budget": change.new_cents });
        let description = describe_change(&change);

        if request.dry_run {
            return ExecutionResult::simulated(
                format!("{DRY_RUN_PREFIX} Would change daily budget of {target} {description}"),
                request_payload,
            );
        }

        match self
            .platform
            .set_daily_budget(request.entity.id(), change.new_cents)
            .await
        {
            Ok(response) => ExecutionResult::Success {
                response_summary: format!("Changed daily budget of {target} {description}"),
                request_payload,
                simulated: false,
                response: Some(response),
            },
            Err(e) => {
                ExecutionResult::failure(format!("Failed to update budget of {target}: {e}"))
            }
        }
    }
}

fn describe(entity: &EntityRef, name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() => {
            format!("{} {} ({name})", entity.entity_type(), entity.id())
        }
        _ => format!("{} {}", entity.entity_type(), entity.id()),
    }
}

fn describe_change(change: &BudgetChange) -> String {
    let mut text = format!(
        "from {} to {} ({:+.1}%)",
        format_cents(change.old_cents),
        format_cents(change.new_cents),
        change.effective_percent()
    );
    if change.clamped {
        text.push_str(", raised to the platform minimum");
    }
    text
}

fn format_cents(cents: i64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
