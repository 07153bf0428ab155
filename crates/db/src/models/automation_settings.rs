//! Automation settings entity models and DTOs.

use adpilot_core::audit::AutomationMode;
use adpilot_core::settings::AutomationPolicy;
use adpilot_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `automation_settings` table (one per ad account).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AutomationSettings {
    pub account_id: String,
    pub mode: String,
    pub dry_run: bool,
    pub scheduler_enabled: bool,
    pub auto_generate_recommendations: bool,
    pub auto_approve_low_risk: bool,
    pub allowed_auto_approve_rule_keys: Vec<String>,
    pub protected_campaign_ids: Vec<String>,
    pub action_cooldown_minutes: i32,
    pub max_actions_per_entity_per_day: i32,
    pub max_applies_per_run: i32,
    pub last_scheduler_run_at: Option<Timestamp>,
    pub last_scheduler_run_status: Option<String>,
    pub last_scheduler_run_summary: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AutomationSettings {
    /// Immutable policy snapshot used by guardrails and the scheduler.
    pub fn to_policy(&self) -> AutomationPolicy {
        AutomationPolicy {
            account_id: self.account_id.clone(),
            mode: AutomationMode::parse(&self.mode).unwrap_or(AutomationMode::Manual),
            dry_run: self.dry_run,
            scheduler_enabled: self.scheduler_enabled,
            auto_generate_recommendations: self.auto_generate_recommendations,
            auto_approve_low_risk: self.auto_approve_low_risk,
            allowed_auto_approve_rule_keys: self
                .allowed_auto_approve_rule_keys
                .iter()
                .cloned()
                .collect(),
            protected_campaign_ids: self.protected_campaign_ids.iter().cloned().collect(),
            action_cooldown_minutes: self.action_cooldown_minutes,
            max_actions_per_entity_per_day: self.max_actions_per_entity_per_day,
            max_applies_per_run: self.max_applies_per_run,
        }
    }
}

/// DTO for `PUT /accounts/{account_id}/settings`.
///
/// Omitted fields keep their stored value (or the column default on insert).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpsertAutomationSettings {
    pub mode: Option<String>,
    pub dry_run: Option<bool>,
    pub scheduler_enabled: Option<bool>,
    pub auto_generate_recommendations: Option<bool>,
    pub auto_approve_low_risk: Option<bool>,
    pub allowed_auto_approve_rule_keys: Option<Vec<String>>,
    pub protected_campaign_ids: Option<Vec<String>>,
    #[validate(range(min = 0))]
    pub action_cooldown_minutes: Option<i32>,
    #[validate(range(min = 0))]
    pub max_actions_per_entity_per_day: Option<i32>,
    #[validate(range(min = 0, max = 1000))]
    pub max_applies_per_run: Option<i32>,
}
