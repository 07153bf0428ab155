//! Audit vocabulary for action logs and scheduler run logs.

use serde::{Deserialize, Serialize};

use crate::vocab::define_text_enum;

define_text_enum! {
    /// Outcome recorded for one apply attempt.
    ActionLogStatus {
        /// The platform accepted the write.
        Success => "success",
        /// The write was simulated (dry-run or mock mode).
        Simulated => "simulated",
        /// A guardrail rejected the attempt before the executor ran.
        Blocked => "blocked",
        /// The executor reported an error.
        Failed => "failed",
    }
}

impl ActionLogStatus {
    /// Whether this outcome actually changed (or simulated changing) state.
    ///
    /// Only these count toward cooldown windows and daily caps.
    pub fn counts_as_action(self) -> bool {
        matches!(self, ActionLogStatus::Success | ActionLogStatus::Simulated)
    }
}

define_text_enum! {
    /// Who initiated an apply attempt.
    TriggeredBy {
        User => "user",
        RuleEngine => "rule_engine",
    }
}

define_text_enum! {
    /// How a scheduler cycle was started.
    RunTrigger {
        Manual => "manual",
        Scheduled => "scheduled",
    }
}

define_text_enum! {
    /// Final status of a scheduler cycle.
    RunStatus {
        Success => "success",
        /// Reserved in the run-log vocabulary; cycles do not currently write it.
        Partial => "partial",
        Failed => "failed",
        Skipped => "skipped",
    }
}

define_text_enum! {
    /// Automation mode configured per account. Informational only; the
    /// behaviour is driven by the individual switches in the settings.
    AutomationMode {
        Manual => "manual",
        Assisted => "assisted",
        Auto => "auto",
    }
}

// ---------------------------------------------------------------------------
// Cycle summary
// ---------------------------------------------------------------------------

/// Counters persisted with every scheduler run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub generated: u32,
    pub auto_approved: u32,
    /// Executor successes, live or simulated.
    pub applied: u32,
    /// Simulated subset of `applied`.
    pub simulated: u32,
    pub blocked: u32,
    pub failed: u32,
    pub skipped: u32,
    pub alerts_sent: u32,
    pub critical_recommendations_generated: u32,
    pub trend_data_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CycleSummary {
    /// Serialize for a JSONB column.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }

    /// Keep the first error only.
    pub fn record_error(&mut self, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(message.into());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
