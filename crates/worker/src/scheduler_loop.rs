//! Fixed-interval loop driving scheduler cycles.
//!
//! Accounts are processed one after another within a tick. Each cycle
//! holds the account's database advisory lock, so a tick waits for (and is
//! waited on by) manual runs and applies served by the API process.

use std::sync::Arc;

use adpilot_core::audit::{RunStatus, RunTrigger};
use adpilot_engine::Automation;
use tokio_util::sync::CancellationToken;

use crate::config::WorkerConfig;

/// Outcome counts for one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub accounts: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub struct SchedulerLoop {
    automation: Arc<Automation>,
    config: WorkerConfig,
}

impl SchedulerLoop {
    pub fn new(automation: Arc<Automation>, config: WorkerConfig) -> Self {
        Self { automation, config }
    }

    /// Run until `cancel` is triggered. The first tick fires immediately.
    ///
    /// Cancellation is checked between ticks; a tick in progress finishes
    /// its current account before the loop stops.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            "Scheduler loop started"
        );

        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Scheduler loop stopping");
                    break;
                }
                _ = interval.tick() => {
                    self.tick(&cancel).await;
                }
            }
        }
    }

    /// Run one scheduled cycle per enabled account.
    pub async fn tick(&self, cancel: &CancellationToken) -> TickReport {
        let mut report = TickReport::default();

        let accounts = match self.automation.store().list_scheduler_enabled_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::error!(error = %e, "Scheduler tick: could not list accounts");
                return report;
            }
        };
        if accounts.is_empty() {
            tracing::debug!("Scheduler tick: no enabled accounts");
            return report;
        }

        for account_id in accounts {
            if cancel.is_cancelled() {
                break;
            }
            report.accounts += 1;
            let cycle = self
                .automation
                .run_scheduler_cycle(&account_id, RunTrigger::Scheduled)
                .await;
            match cycle.status {
                RunStatus::Failed => report.failed += 1,
                RunStatus::Skipped => report.skipped += 1,
                RunStatus::Success | RunStatus::Partial => report.succeeded += 1,
            }
        }

        tracing::info!(
            accounts = report.accounts,
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            "Scheduler tick finished"
        );
        report
    }
}
