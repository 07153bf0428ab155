//! Scheduler cycle behavior against the in-memory store.

mod common;

use std::time::Duration as StdDuration;

use adpilot_core::alert::{EVENT_CRITICAL_RECOMMENDATION, EVENT_GENERATION_FAILED, EVENT_SCHEDULER_FAILED};
use adpilot_core::audit::{RunStatus, RunTrigger};
use adpilot_db::models::automation_settings::UpsertAutomationSettings;
use adpilot_db::models::recommendation::CreateRecommendation;
use adpilot_engine::{ApplyOptions, ApplyOutcome, AutomationStore, GenerationReport};
use chrono::{Duration, Utc};
use common::{
    dry_run_settings, live_settings, FailingGenerator, Harness, StaticGenerator, ACCOUNT,
};

// ---------------------------------------------------------------------------
// Skip law
// ---------------------------------------------------------------------------

#[tokio::test]
async fn disabled_scheduler_skips_regardless_of_other_settings() {
    let h = Harness::live().with_generator(FailingGenerator);
    h.settings(UpsertAutomationSettings {
        scheduler_enabled: Some(false),
        auto_generate_recommendations: Some(true),
        auto_approve_low_risk: Some(true),
        allowed_auto_approve_rule_keys: Some(vec!["zero_leads".to_string()]),
        ..live_settings()
    })
    .await;
    let rec = h.recommendation(|_| {}).await;

    let report = h.automation.run_scheduler_cycle(ACCOUNT, RunTrigger::Manual).await;

    assert_eq!(report.status, RunStatus::Skipped);
    assert_eq!(report.summary.generated, 0);
    assert_eq!(report.summary.applied, 0);
    assert_eq!(report.summary.blocked, 0);
    assert_eq!(report.summary.failed, 0);
    assert!(h.logs().await.is_empty());
    assert!(h.alerter.events().is_empty());
    assert_eq!(h.reload(rec.id).await.status, "approved");

    let runs = h.store.run_logs().await;
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, "skipped");
    assert_eq!(runs[0].trigger, "manual");
    assert!(runs[0].finished_at.is_some());
}

#[tokio::test]
async fn missing_settings_skip_the_cycle() {
    let h = Harness::live();
    h.recommendation(|_| {}).await;

    let report = h.automation.run_scheduler_cycle(ACCOUNT, RunTrigger::Scheduled).await;

    assert_eq!(report.status, RunStatus::Skipped);
    assert!(report.run_log_id.is_some());
    assert!(h.logs().await.is_empty());
    assert!(h.store.run_logs().await[0].dry_run);
}

// ---------------------------------------------------------------------------
// End-to-end scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn queued_recommendation_is_not_applied_without_auto_approval() {
    let h = Harness::live();
    h.settings(dry_run_settings()).await;
    let rec = h.recommendation(|r| r.status = Some("queued".to_string())).await;

    let report = h.automation.run_scheduler_cycle(ACCOUNT, RunTrigger::Manual).await;

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.summary.generated, 0);
    assert_eq!(report.summary.auto_approved, 0);
    assert_eq!(report.summary.applied, 0);
    assert!(report.summary.error.is_none());
    assert!(h.logs().await.is_empty());
    assert_eq!(h.reload(rec.id).await.status, "queued");
}

#[tokio::test]
async fn approved_recommendation_is_simulated_in_dry_run() {
    let h = Harness::live();
    h.settings(dry_run_settings()).await;
    let rec = h.recommendation(|_| {}).await;

    let report = h.automation.run_scheduler_cycle(ACCOUNT, RunTrigger::Manual).await;

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.summary.applied, 1);
    assert_eq!(report.summary.simulated, 1);

    let logs = h.logs().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, "simulated");
    assert_eq!(logs[0].triggered_by, "rule_engine");
    assert_eq!(h.reload(rec.id).await.status, "approved");
    assert!(h.platform.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Auto-approval
// ---------------------------------------------------------------------------

#[tokio::test]
async fn auto_approval_respects_allow_list_severity_and_action() {
    let h = Harness::live();
    h.settings(UpsertAutomationSettings {
        auto_approve_low_risk: Some(true),
        allowed_auto_approve_rule_keys: Some(vec!["zero_leads".to_string()]),
        ..dry_run_settings()
    })
    .await;
    let queued = |r: &mut CreateRecommendation| {
        r.status = Some("queued".to_string());
    };

    let eligible = h.recommendation(queued).await;
    let critical = h
        .recommendation(|r| {
            queued(r);
            r.entity_id = "c2".to_string();
            r.severity = Some("critical".to_string());
        })
        .await;
    let other_rule = h
        .recommendation(|r| {
            queued(r);
            r.entity_id = "c3".to_string();
            r.rule_key = "high_cpl".to_string();
        })
        .await;
    let informational = h
        .recommendation(|r| {
            queued(r);
            r.entity_id = "c4".to_string();
            r.action_type = "investigate".to_string();
        })
        .await;

    let report = h.automation.run_scheduler_cycle(ACCOUNT, RunTrigger::Manual).await;

    assert_eq!(report.summary.auto_approved, 1);
    assert_eq!(report.summary.applied, 1);
    assert_eq!(report.summary.simulated, 1);
    assert_eq!(h.reload(eligible.id).await.status, "approved");
    assert!(h.reload(eligible.id).await.approved_at.is_some());
    for id in [critical.id, other_rule.id, informational.id] {
        assert_eq!(h.reload(id).await.status, "queued");
    }
}

#[tokio::test]
async fn empty_allow_list_disables_auto_approval() {
    let h = Harness::live();
    h.settings(UpsertAutomationSettings {
        auto_approve_low_risk: Some(true),
        allowed_auto_approve_rule_keys: Some(Vec::new()),
        ..dry_run_settings()
    })
    .await;
    let rec = h.recommendation(|r| r.status = Some("queued".to_string())).await;

    let report = h.automation.run_scheduler_cycle(ACCOUNT, RunTrigger::Manual).await;

    assert_eq!(report.summary.auto_approved, 0);
    assert_eq!(report.summary.applied, 0);
    assert_eq!(h.reload(rec.id).await.status, "queued");
}

// ---------------------------------------------------------------------------
// Apply phase
// ---------------------------------------------------------------------------

#[tokio::test]
async fn apply_phase_takes_oldest_first_up_to_cap() {
    let h = Harness::live();
    h.settings(UpsertAutomationSettings {
        max_applies_per_run: Some(2),
        ..live_settings()
    })
    .await;
    let first = h.recommendation(|r| r.entity_id = "c1".to_string()).await;
    let second = h.recommendation(|r| r.entity_id = "c2".to_string()).await;
    let third = h.recommendation(|r| r.entity_id = "c3".to_string()).await;

    let report = h.automation.run_scheduler_cycle(ACCOUNT, RunTrigger::Manual).await;

    assert_eq!(report.summary.applied, 2);
    assert_eq!(report.summary.simulated, 0);
    assert_eq!(h.reload(first.id).await.status, "applied");
    assert_eq!(h.reload(second.id).await.status, "applied");
    assert_eq!(h.reload(third.id).await.status, "approved");
    assert_eq!(
        h.platform.calls(),
        vec!["set_status c1 PAUSED".to_string(), "set_status c2 PAUSED".to_string()]
    );
}

#[tokio::test]
async fn zero_apply_cap_still_applies_one() {
    let h = Harness::live();
    h.settings(UpsertAutomationSettings {
        max_applies_per_run: Some(0),
        ..live_settings()
    })
    .await;
    h.recommendation(|r| r.entity_id = "c1".to_string()).await;
    h.recommendation(|r| r.entity_id = "c2".to_string()).await;

    let report = h.automation.run_scheduler_cycle(ACCOUNT, RunTrigger::Manual).await;

    assert_eq!(report.summary.applied, 1);
}

#[tokio::test]
async fn executor_failure_fails_cycle_with_first_error() {
    let h = Harness::live();
    h.settings(live_settings()).await;
    h.platform.fail_with("(#2) Service temporarily unavailable");
    h.recommendation(|r| r.entity_id = "c1".to_string()).await;
    h.recommendation(|r| r.entity_id = "c2".to_string()).await;

    let report = h.automation.run_scheduler_cycle(ACCOUNT, RunTrigger::Manual).await;

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.summary.failed, 2);
    assert_eq!(report.summary.applied, 0);
    let error = report.summary.error.unwrap();
    assert!(error.contains("Service temporarily unavailable"));

    let run = &h.store.run_logs().await[0];
    assert_eq!(run.status, "failed");
    assert_eq!(run.summary["failed"], 2);
}

#[tokio::test]
async fn blocked_applies_do_not_fail_the_cycle() {
    let h = Harness::live();
    h.settings(UpsertAutomationSettings {
        protected_campaign_ids: Some(vec!["c1".to_string()]),
        ..live_settings()
    })
    .await;
    h.recommendation(|_| {}).await;

    let report = h.automation.run_scheduler_cycle(ACCOUNT, RunTrigger::Manual).await;

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.summary.blocked, 1);
    assert_eq!(report.summary.applied, 0);
    assert_eq!(h.logs().await[0].status, "blocked");
}

// ---------------------------------------------------------------------------
// Generation and alerts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generation_failure_alerts_and_skips_apply() {
    let h = Harness::live().with_generator(FailingGenerator);
    h.settings(UpsertAutomationSettings {
        auto_generate_recommendations: Some(true),
        ..live_settings()
    })
    .await;
    let rec = h.recommendation(|_| {}).await;

    let report = h.automation.run_scheduler_cycle(ACCOUNT, RunTrigger::Scheduled).await;

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.summary.applied, 0);
    assert_eq!(report.summary.alerts_sent, 1);
    assert_eq!(
        report.summary.error.as_deref(),
        Some("Recommendation generation failed: insights API unavailable")
    );
    assert_eq!(h.reload(rec.id).await.status, "approved");

    let events = h.alerter.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EVENT_GENERATION_FAILED);
}

#[tokio::test]
async fn critical_alerts_are_capped_per_cycle() {
    let h = Harness::live();
    let mut critical = Vec::new();
    for i in 0..7 {
        let rec = h
            .recommendation(|r| {
                r.entity_id = format!("c{i}");
                r.severity = Some("critical".to_string());
                r.status = Some("queued".to_string());
            })
            .await;
        critical.push(rec);
    }
    let h = h.with_generator(StaticGenerator(GenerationReport {
        generated: 7,
        critical,
        trend_data_available: true,
    }));
    h.settings(UpsertAutomationSettings {
        auto_generate_recommendations: Some(true),
        ..dry_run_settings()
    })
    .await;

    let report = h.automation.run_scheduler_cycle(ACCOUNT, RunTrigger::Manual).await;

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.summary.generated, 7);
    assert_eq!(report.summary.critical_recommendations_generated, 7);
    assert!(report.summary.trend_data_available);
    assert_eq!(report.summary.alerts_sent, 5);

    let events = h.alerter.events();
    assert_eq!(events.len(), 5);
    assert!(events.iter().all(|e| e.event_type == EVENT_CRITICAL_RECOMMENDATION));
}

#[tokio::test]
async fn undelivered_alerts_are_not_counted() {
    let h = Harness::with_undeliverable_alerts().with_generator(FailingGenerator);
    h.settings(UpsertAutomationSettings {
        auto_generate_recommendations: Some(true),
        ..live_settings()
    })
    .await;

    let report = h.automation.run_scheduler_cycle(ACCOUNT, RunTrigger::Manual).await;

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.summary.alerts_sent, 0);
    assert_eq!(h.alerter.events().len(), 1);
}

#[tokio::test]
async fn store_outage_fails_cycle_and_alerts() {
    let h = Harness::live();
    h.settings(live_settings()).await;
    h.store.set_unavailable(true);

    let report = h.automation.run_scheduler_cycle(ACCOUNT, RunTrigger::Scheduled).await;

    assert_eq!(report.status, RunStatus::Failed);
    assert!(report.run_log_id.is_none());
    assert_eq!(
        report.summary.error.as_deref(),
        Some("Store error: store unavailable")
    );
    let events = h.alerter.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EVENT_SCHEDULER_FAILED);
}

// ---------------------------------------------------------------------------
// Bookkeeping and concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn last_run_is_recorded_on_settings() {
    let h = Harness::live();
    h.settings(dry_run_settings()).await;
    h.recommendation(|_| {}).await;

    let report = h.automation.run_scheduler_cycle(ACCOUNT, RunTrigger::Manual).await;

    let settings = h.store.get_settings(ACCOUNT).await.unwrap().unwrap();
    assert_eq!(settings.last_scheduler_run_status.as_deref(), Some("success"));
    assert!(settings.last_scheduler_run_at.is_some());
    let summary = settings.last_scheduler_run_summary.unwrap();
    assert_eq!(summary["simulated"], 1);

    let runs = h.store.list_run_logs(ACCOUNT, None).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(Some(runs[0].id), report.run_log_id);
    assert_eq!(runs[0].summary, summary);
}

#[tokio::test]
async fn two_engines_sharing_a_store_apply_one_entity_once() {
    let h = Harness::live();
    h.settings(UpsertAutomationSettings {
        action_cooldown_minutes: Some(60),
        ..live_settings()
    })
    .await;
    h.platform.set_latency(StdDuration::from_millis(50));
    let a = h.recommendation(|_| {}).await;
    let b = h.recommendation(|_| {}).await;
    let worker = h.second_engine();

    let (first, second) = tokio::join!(
        h.automation.apply_recommendation(ACCOUNT, a.id, ApplyOptions::user(false)),
        worker.apply_recommendation(ACCOUNT, b.id, ApplyOptions::rule_engine()),
    );
    let outcomes = [first.unwrap(), second.unwrap()];

    let applied = outcomes
        .iter()
        .filter(|o| matches!(o, ApplyOutcome::Applied { .. }))
        .count();
    let blocked = outcomes
        .iter()
        .filter(|o| matches!(o, ApplyOutcome::Blocked { .. }))
        .count();
    assert_eq!((applied, blocked), (1, 1));
    assert_eq!(h.platform.calls(), vec!["set_status c1 PAUSED".to_string()]);
}

#[tokio::test]
async fn manual_apply_and_scheduled_cycle_do_not_compound_budget_changes() {
    let h = Harness::live();
    h.settings(UpsertAutomationSettings {
        action_cooldown_minutes: Some(60),
        ..live_settings()
    })
    .await;
    h.platform.set_budget(Some(1000), None);
    h.platform.set_latency(StdDuration::from_millis(50));
    let manual = h
        .recommendation(|r| r.action_type = "increase_budget".to_string())
        .await;
    h.recommendation(|r| r.action_type = "increase_budget".to_string())
        .await;
    let worker = h.second_engine();

    let (outcome, report) = tokio::join!(
        h.automation.apply_recommendation(ACCOUNT, manual.id, ApplyOptions::user(false)),
        worker.run_scheduler_cycle(ACCOUNT, RunTrigger::Scheduled),
    );
    outcome.unwrap();

    let writes: Vec<String> = h
        .platform
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("set_daily_budget"))
        .collect();
    assert_eq!(writes, vec!["set_daily_budget c1 1100".to_string()]);
    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.summary.blocked, 1);
}

#[tokio::test]
async fn recent_prior_action_blocks_scheduled_apply() {
    let h = Harness::live();
    h.settings(UpsertAutomationSettings {
        action_cooldown_minutes: Some(60),
        ..live_settings()
    })
    .await;
    h.prior_action("success", Utc::now() - Duration::minutes(5)).await;
    h.recommendation(|_| {}).await;

    let report = h.automation.run_scheduler_cycle(ACCOUNT, RunTrigger::Scheduled).await;

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.summary.blocked, 1);
    assert!(h.platform.calls().is_empty());
}
