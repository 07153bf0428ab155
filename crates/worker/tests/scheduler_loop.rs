//! Scheduler loop against the in-memory store in mock integration mode.

use std::sync::Arc;
use std::time::Duration;

use adpilot_db::models::automation_settings::UpsertAutomationSettings;
use adpilot_engine::{Automation, AutomationStore, EngineConfig, MemoryStore};
use adpilot_events::AlertDispatcher;
use adpilot_meta::{MetaClient, MetaConfig};
use adpilot_worker::{SchedulerLoop, TickReport, WorkerConfig};
use tokio_util::sync::CancellationToken;

fn automation(store: Arc<MemoryStore>) -> Arc<Automation> {
    let platform = MetaClient::new(&MetaConfig::default()).unwrap();
    Arc::new(Automation::new(
        store as Arc<dyn AutomationStore>,
        Arc::new(platform),
        Arc::new(AlertDispatcher::log_only()),
        EngineConfig::mock(),
    ))
}

async fn enable(store: &MemoryStore, account_id: &str, enabled: bool) {
    store
        .upsert_settings(
            account_id,
            &UpsertAutomationSettings {
                scheduler_enabled: Some(enabled),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn tick_runs_only_enabled_accounts() {
    let store = Arc::new(MemoryStore::new());
    enable(&store, "act_a", true).await;
    enable(&store, "act_b", false).await;
    enable(&store, "act_c", true).await;

    let scheduler = SchedulerLoop::new(automation(store.clone()), WorkerConfig::default());
    let report = scheduler.tick(&CancellationToken::new()).await;

    assert_eq!(
        report,
        TickReport {
            accounts: 2,
            succeeded: 2,
            failed: 0,
            skipped: 0,
        }
    );
    let runs = store.run_logs().await;
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|r| r.trigger == "scheduled"));
    assert!(runs.iter().all(|r| r.account_id != "act_b"));
}

#[tokio::test]
async fn tick_survives_store_outage() {
    let store = Arc::new(MemoryStore::new());
    enable(&store, "act_a", true).await;
    store.set_unavailable(true);

    let scheduler = SchedulerLoop::new(automation(store.clone()), WorkerConfig::default());
    let report = scheduler.tick(&CancellationToken::new()).await;

    assert_eq!(report, TickReport::default());
}

#[tokio::test]
async fn cancelled_tick_runs_nothing() {
    let store = Arc::new(MemoryStore::new());
    enable(&store, "act_a", true).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let scheduler = SchedulerLoop::new(automation(store.clone()), WorkerConfig::default());
    let report = scheduler.tick(&cancel).await;

    assert_eq!(report.accounts, 0);
    assert!(store.run_logs().await.is_empty());
}

#[tokio::test]
async fn loop_ticks_immediately_and_stops_on_cancel() {
    let store = Arc::new(MemoryStore::new());
    enable(&store, "act_a", true).await;

    let scheduler = SchedulerLoop::new(automation(store.clone()), WorkerConfig::default());
    let cancel = CancellationToken::new();
    let loop_cancel = cancel.clone();
    let handle = tokio::spawn(async move { scheduler.run(loop_cancel).await });

    let mut ran = false;
    for _ in 0..200 {
        if !store.run_logs().await.is_empty() {
            ran = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(ran, "first tick should fire immediately");

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop should stop after cancel")
        .unwrap();
    assert_eq!(store.run_logs().await.len(), 1);
}
