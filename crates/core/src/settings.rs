//! Per-account automation policy snapshot.
//!
//! [`AutomationPolicy`] is loaded once per cycle (or per single apply) and
//! passed by reference to every guardrail and pipeline step, so a cycle
//! decides everything against one consistent view of the settings.

use std::collections::HashSet;

use crate::audit::AutomationMode;
use crate::recommendation::{ActionType, RecommendationStatus, Severity};

/// Hard ceiling on applies per scheduler cycle, whatever the settings say.
pub const MAX_APPLIES_PER_RUN_CEILING: u32 = 50;

/// Maximum number of per-recommendation alerts sent for newly generated
/// critical recommendations in one cycle.
pub const MAX_CRITICAL_ALERTS_PER_RUN: usize = 5;

// ---------------------------------------------------------------------------
// Advisory lock constant
// ---------------------------------------------------------------------------

/// First key of the two-key PostgreSQL advisory lock taken per account.
/// The second key is `hashtext(account_id)`.
pub const ACCOUNT_LOCK_NAMESPACE: i32 = 918_273_646;

/// Immutable automation settings for one ad account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationPolicy {
    pub account_id: String,
    pub mode: AutomationMode,
    /// When true the executor never writes to the platform.
    pub dry_run: bool,
    pub scheduler_enabled: bool,
    pub auto_generate_recommendations: bool,
    pub auto_approve_low_risk: bool,
    pub allowed_auto_approve_rule_keys: HashSet<String>,
    pub protected_campaign_ids: HashSet<String>,
    pub action_cooldown_minutes: i32,
    pub max_actions_per_entity_per_day: i32,
    pub max_applies_per_run: i32,
}

impl AutomationPolicy {
    /// Fail-safe policy used when an account has no stored settings.
    ///
    /// Dry-run on, scheduler off, nothing auto-approved.
    pub fn fail_safe(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            mode: AutomationMode::Manual,
            dry_run: true,
            scheduler_enabled: false,
            auto_generate_recommendations: false,
            auto_approve_low_risk: false,
            allowed_auto_approve_rule_keys: HashSet::new(),
            protected_campaign_ids: HashSet::new(),
            action_cooldown_minutes: 0,
            max_actions_per_entity_per_day: 0,
            max_applies_per_run: 5,
        }
    }

    /// Number of approved recommendations a cycle may apply.
    ///
    /// Clamped to `1..=50` so a zero, negative or huge setting cannot
    /// stall or flood a cycle.
    pub fn apply_cap(&self) -> u32 {
        let requested = self.max_applies_per_run.max(1) as u32;
        requested.min(MAX_APPLIES_PER_RUN_CEILING)
    }

    /// Whether the auto-approval phase runs at all.
    pub fn auto_approval_enabled(&self) -> bool {
        self.auto_approve_low_risk && !self.allowed_auto_approve_rule_keys.is_empty()
    }

    /// Whether a recommendation may be approved without a human.
    ///
    /// Requires a `queued` status, an allow-listed rule key, an executable
    /// action and a non-critical severity. Critical severity always wins,
    /// even for allow-listed rules.
    pub fn is_auto_approvable(
        &self,
        status: &str,
        rule_key: &str,
        severity: &str,
        action_type: &str,
    ) -> bool {
        if !self.auto_approval_enabled() {
            return false;
        }
        if RecommendationStatus::parse(status) != Some(RecommendationStatus::Queued) {
            return false;
        }
        if Severity::parse(severity) == Some(Severity::Critical) {
            return false;
        }
        if !ActionType::parse(action_type).is_some_and(ActionType::is_executable) {
            return false;
        }
        self.allowed_auto_approve_rule_keys.contains(rule_key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
