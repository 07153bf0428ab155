//! Guardrail evaluator.
//!
//! Pure policy checks run by the apply pipeline before the executor is
//! invoked. No I/O: callers load the relevant action logs and pass them in
//! together with the current time.

use chrono::{Duration, NaiveTime};

use crate::audit::ActionLogStatus;
use crate::recommendation::{EntityRef, EntityType};
use crate::settings::AutomationPolicy;
use crate::types::Timestamp;

/// Result of a single guardrail check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow,
    Block { reason: String },
}

impl GuardrailDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardrailDecision::Allow)
    }

    fn block(reason: impl Into<String>) -> Self {
        GuardrailDecision::Block {
            reason: reason.into(),
        }
    }
}

/// One previously logged action, as seen by the cooldown and cap checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedAction {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub status: ActionLogStatus,
    pub created_at: Timestamp,
}

impl LoggedAction {
    fn is_for(&self, entity_type: EntityType, entity_id: &str) -> bool {
        self.entity_type == entity_type && self.entity_id == entity_id
    }
}

// ---------------------------------------------------------------------------
// Protection
// ---------------------------------------------------------------------------

/// Block actions on protected campaigns and anything underneath them.
///
/// Protection flows downward only: protecting a campaign covers its ad sets
/// and ads, but an ad set id in the list does not protect its campaign.
pub fn check_protected(entity: &EntityRef, policy: &AutomationPolicy) -> GuardrailDecision {
    let protected = &policy.protected_campaign_ids;
    if protected.is_empty() {
        return GuardrailDecision::Allow;
    }

    match entity {
        EntityRef::Campaign { id } if protected.contains(id) => {
            GuardrailDecision::block(format!("Campaign {id} is protected"))
        }
        EntityRef::AdSet {
            campaign_id: Some(parent),
            ..
        }
        | EntityRef::Ad {
            campaign_id: Some(parent),
            ..
        } if protected.contains(parent) => GuardrailDecision::block(format!(
            "Parent campaign {parent} of {} {} is protected",
            entity.entity_type(),
            entity.id()
        )),
        _ => GuardrailDecision::Allow,
    }
}

// ---------------------------------------------------------------------------
// Cooldown
// ---------------------------------------------------------------------------

/// Start of the cooldown window ending at `now`.
pub fn cooldown_cutoff(policy: &AutomationPolicy, now: Timestamp) -> Timestamp {
    now - Duration::minutes(i64::from(policy.action_cooldown_minutes.max(0)))
}

/// Block when a counted action on the same entity happened inside the
/// cooldown window. Failed and blocked attempts never count.
pub fn check_cooldown(
    entity_type: EntityType,
    entity_id: &str,
    policy: &AutomationPolicy,
    recent: &[LoggedAction],
    now: Timestamp,
) -> GuardrailDecision {
    let minutes = policy.action_cooldown_minutes;
    if minutes <= 0 {
        return GuardrailDecision::Allow;
    }

    let cutoff = cooldown_cutoff(policy, now);
    let last = recent
        .iter()
        .filter(|a| a.is_for(entity_type, entity_id))
        .filter(|a| a.status.counts_as_action() && a.created_at >= cutoff)
        .map(|a| a.created_at)
        .max();

    match last {
        Some(at) => GuardrailDecision::block(format!(
            "Cooldown active: last action on {entity_type} {entity_id} at {} (cooldown {minutes} min)",
            at.to_rfc3339()
        )),
        None => GuardrailDecision::Allow,
    }
}

// ---------------------------------------------------------------------------
// Daily cap
// ---------------------------------------------------------------------------

/// Midnight UTC of the day containing `now`.
pub fn start_of_day(now: Timestamp) -> Timestamp {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Block once the entity already has `max_actions_per_entity_per_day`
/// counted actions today. A cap of zero or less disables the check.
pub fn check_daily_cap(
    entity_type: EntityType,
    entity_id: &str,
    policy: &AutomationPolicy,
    todays: &[LoggedAction],
    now: Timestamp,
) -> GuardrailDecision {
    let cap = policy.max_actions_per_entity_per_day;
    if cap <= 0 {
        return GuardrailDecision::Allow;
    }

    let day_start = start_of_day(now);
    let count = todays
        .iter()
        .filter(|a| a.is_for(entity_type, entity_id))
        .filter(|a| a.status.counts_as_action() && a.created_at >= day_start)
        .count();

    if count >= cap as usize {
        GuardrailDecision::block(format!(
            "Daily cap reached: {count} of {cap} actions already taken on {entity_type} {entity_id} today"
        ))
    } else {
        GuardrailDecision::Allow
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn policy() -> AutomationPolicy {
        AutomationPolicy::fail_safe("act_1")
    }

    fn protected(ids: &[&str]) -> AutomationPolicy {
        AutomationPolicy {
            protected_campaign_ids: ids.iter().map(|s| s.to_string()).collect(),
            ..policy()
        }
    }

    fn logged(entity_id: &str, status: ActionLogStatus, at: Timestamp) -> LoggedAction {
        LoggedAction {
            entity_type: EntityType::AdSet,
            entity_id: entity_id.to_string(),
            status,
            created_at: at,
        }
    }

    fn noon() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    // -- protection --

    #[test]
    fn empty_protection_list_allows_everything() {
        let entity = EntityRef::Campaign { id: "c1".into() };
        assert!(check_protected(&entity, &policy()).is_allowed());
    }

    #[test]
    fn protected_campaign_is_blocked() {
        let entity = EntityRef::Campaign { id: "c1".into() };
        assert_matches!(
            check_protected(&entity, &protected(&["c1"])),
            GuardrailDecision::Block { reason } if reason.contains("c1")
        );
    }

    #[test]
    fn children_of_protected_campaign_are_blocked() {
        let policy = protected(&["c1"]);
        let adset = EntityRef::AdSet {
            id: "as1".into(),
            campaign_id: Some("c1".into()),
        };
        let ad = EntityRef::Ad {
            id: "ad1".into(),
            campaign_id: Some("c1".into()),
        };
        assert!(!check_protected(&adset, &policy).is_allowed());
        assert!(!check_protected(&ad, &policy).is_allowed());
    }

    #[test]
    fn children_of_unprotected_campaign_pass() {
        let adset = EntityRef::AdSet {
            id: "as1".into(),
            campaign_id: Some("c2".into()),
        };
        assert!(check_protected(&adset, &protected(&["c1"])).is_allowed());
    }

    #[test]
    fn protection_is_not_inherited_upward() {
        // An ad set id in the protected list does not protect anything else.
        let campaign = EntityRef::Campaign { id: "c1".into() };
        assert!(check_protected(&campaign, &protected(&["as1"])).is_allowed());
        let orphan = EntityRef::Ad {
            id: "ad1".into(),
            campaign_id: None,
        };
        assert!(check_protected(&orphan, &protected(&["c1"])).is_allowed());
    }

    // -- cooldown --

    #[test]
    fn cooldown_disabled_when_zero() {
        let logs = vec![logged("as1", ActionLogStatus::Success, noon())];
        assert!(check_cooldown(EntityType::AdSet, "as1", &policy(), &logs, noon()).is_allowed());
    }

    #[test]
    fn cooldown_blocks_inside_window_and_releases_after() {
        let policy = AutomationPolicy {
            action_cooldown_minutes: 60,
            ..policy()
        };
        let t = noon();
        let logs = vec![logged("as1", ActionLogStatus::Simulated, t)];
        let eps = Duration::seconds(1);

        let inside = t + Duration::minutes(60) - eps;
        let outside = t + Duration::minutes(60) + eps;

        assert_matches!(
            check_cooldown(EntityType::AdSet, "as1", &policy, &logs, inside),
            GuardrailDecision::Block { reason } if reason.contains("Cooldown active")
        );
        assert!(check_cooldown(EntityType::AdSet, "as1", &policy, &logs, outside).is_allowed());
    }

    #[test]
    fn failed_and_blocked_logs_do_not_start_cooldown() {
        let policy = AutomationPolicy {
            action_cooldown_minutes: 60,
            ..policy()
        };
        let logs = vec![
            logged("as1", ActionLogStatus::Failed, noon()),
            logged("as1", ActionLogStatus::Blocked, noon()),
        ];
        assert!(check_cooldown(EntityType::AdSet, "as1", &policy, &logs, noon()).is_allowed());
    }

    #[test]
    fn cooldown_ignores_other_entities() {
        let policy = AutomationPolicy {
            action_cooldown_minutes: 60,
            ..policy()
        };
        let logs = vec![logged("as2", ActionLogStatus::Success, noon())];
        assert!(check_cooldown(EntityType::AdSet, "as1", &policy, &logs, noon()).is_allowed());
    }

    // -- daily cap --

    #[test]
    fn cap_disabled_when_zero() {
        let logs = vec![logged("as1", ActionLogStatus::Success, noon()); 10];
        assert!(check_daily_cap(EntityType::AdSet, "as1", &policy(), &logs, noon()).is_allowed());
    }

    #[test]
    fn cap_blocks_the_n_plus_first_action() {
        let policy = AutomationPolicy {
            max_actions_per_entity_per_day: 2,
            ..policy()
        };
        let one = vec![logged("as1", ActionLogStatus::Success, noon())];
        assert!(check_daily_cap(EntityType::AdSet, "as1", &policy, &one, noon()).is_allowed());

        let two = vec![
            logged("as1", ActionLogStatus::Success, noon()),
            logged("as1", ActionLogStatus::Simulated, noon()),
        ];
        assert_matches!(
            check_daily_cap(EntityType::AdSet, "as1", &policy, &two, noon()),
            GuardrailDecision::Block { reason } if reason.contains("2 of 2")
        );
    }

    #[test]
    fn cap_ignores_failed_blocked_and_yesterday() {
        let policy = AutomationPolicy {
            max_actions_per_entity_per_day: 1,
            ..policy()
        };
        let logs = vec![
            logged("as1", ActionLogStatus::Failed, noon()),
            logged("as1", ActionLogStatus::Blocked, noon()),
            logged("as1", ActionLogStatus::Success, noon() - Duration::days(1)),
        ];
        assert!(check_daily_cap(EntityType::AdSet, "as1", &policy, &logs, noon()).is_allowed());
    }

    #[test]
    fn start_of_day_is_midnight_utc() {
        let midnight = Utc.with_ymd_and_hms(2026, 3, 14, 0, 0, 0).unwrap();
        assert_eq!(start_of_day(noon()), midnight);
    }
}
