//! Budget change arithmetic for `increase_budget` / `decrease_budget`.
//!
//! Budgets are integer minor currency units (cents), as the ad platform
//! reports them.

use serde_json::Value;

use crate::recommendation::ActionType;

/// Smallest daily budget the platform accepts (the equivalent of $1).
pub const MIN_DAILY_BUDGET_CENTS: i64 = 100;

/// Percentage applied when the payload does not specify one.
pub const DEFAULT_PERCENT_CHANGE: f64 = 10.0;

/// A computed budget change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetChange {
    pub old_cents: i64,
    pub new_cents: i64,
    /// Requested percentage (always positive).
    pub percent: f64,
    /// Whether the computed value was raised to [`MIN_DAILY_BUDGET_CENTS`].
    pub clamped: bool,
}

impl BudgetChange {
    /// Effective signed change relative to the old budget, in percent.
    pub fn effective_percent(&self) -> f64 {
        if self.old_cents == 0 {
            return 0.0;
        }
        (self.new_cents - self.old_cents) as f64 / self.old_cents as f64 * 100.0
    }
}

/// Read the requested percentage from a recommendation payload.
///
/// Looks at `percentIncrease` / `percentDecrease` (depending on the action)
/// and then a generic `percent`. Missing, non-numeric or non-positive values
/// fall back to [`DEFAULT_PERCENT_CHANGE`].
pub fn percent_from_payload(action: ActionType, payload: &Value) -> f64 {
    let specific = match action {
        ActionType::IncreaseBudget => "percentIncrease",
        ActionType::DecreaseBudget => "percentDecrease",
        _ => return DEFAULT_PERCENT_CHANGE,
    };

    [specific, "percent"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(as_f64))
        .filter(|p| p.is_finite() && *p > 0.0)
        .unwrap_or(DEFAULT_PERCENT_CHANGE)
}

/// Compute the new budget for a budget action.
///
/// `increase -> round(current * (1 + pct/100))`,
/// `decrease -> round(current * (1 - pct/100))`, then clamped up to the
/// platform minimum. Returns `None` for non-budget actions.
pub fn compute_budget_change(action: ActionType, current_cents: i64, percent: f64) -> Option<BudgetChange> {
    let factor = match action {
        ActionType::IncreaseBudget => 1.0 + percent / 100.0,
        ActionType::DecreaseBudget => 1.0 - percent / 100.0,
        _ => return None,
    };

    let raw = (current_cents as f64 * factor).round() as i64;
    let clamped = raw < MIN_DAILY_BUDGET_CENTS;
    Some(BudgetChange {
        old_cents: current_cents,
        new_cents: raw.max(MIN_DAILY_BUDGET_CENTS),
        percent,
        clamped,
    })
}

/// Interpret a JSON value (number or numeric string) as `f64`.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Interpret a JSON value (number or numeric string) as integer cents.
pub fn as_cents(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
