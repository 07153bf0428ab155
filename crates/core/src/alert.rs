//! Alert event handed to the alerting collaborator.

use serde::Serialize;

use crate::types::Timestamp;
use crate::vocab::define_text_enum;

/// A generated recommendation has `critical` severity.
pub const EVENT_CRITICAL_RECOMMENDATION: &str = "automation.critical_recommendation";
/// Recommendation generation failed; the cycle was aborted.
pub const EVENT_GENERATION_FAILED: &str = "automation.generation_failed";
/// A scheduler cycle hit an unexpected error.
pub const EVENT_SCHEDULER_FAILED: &str = "automation.scheduler_failed";

define_text_enum! {
    /// Alert severity level.
    AlertSeverity {
        Info => "info",
        Warning => "warning",
        Critical => "critical",
    }
}

/// One alert about an automation outcome.
#[derive(Debug, Clone, Serialize)]
pub struct AlertEvent {
    pub event_type: String,
    pub severity: AlertSeverity,
    pub account_id: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub entity_name: Option<String>,
    pub rule_key: Option<String>,
    pub evidence: Option<serde_json::Value>,
    pub message: String,
    pub timestamp: Timestamp,
}

impl AlertEvent {
    /// Create an alert with only the required fields.
    pub fn new(
        event_type: impl Into<String>,
        severity: AlertSeverity,
        account_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            severity,
            account_id: account_id.into(),
            entity_type: None,
            entity_id: None,
            entity_name: None,
            rule_key: None,
            evidence: None,
            message: message.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Attach the entity the alert is about.
    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self.entity_name = entity_name;
        self
    }

    /// Attach the detection rule and its evidence snapshot.
    pub fn with_rule(mut self, rule_key: impl Into<String>, evidence: serde_json::Value) -> Self {
        self.rule_key = Some(rule_key.into());
        self.evidence = Some(evidence);
        self
    }
}
