//! Scheduler cycle: generate, auto-approve, apply.
//!
//! A cycle never returns an error. Store failures and generation failures
//! end the cycle as `failed`, raise a critical alert, and are persisted on
//! the run log together with whatever counters were gathered so far.

use adpilot_core::alert::{
    AlertEvent, AlertSeverity, EVENT_CRITICAL_RECOMMENDATION, EVENT_GENERATION_FAILED,
    EVENT_SCHEDULER_FAILED,
};
use adpilot_core::audit::{CycleSummary, RunStatus, RunTrigger};
use adpilot_core::recommendation::RecommendationStatus;
use adpilot_core::settings::{AutomationPolicy, MAX_CRITICAL_ALERTS_PER_RUN};
use adpilot_core::types::DbId;
use chrono::Utc;
use serde::Serialize;

use crate::automation::Automation;
use crate::error::EngineError;
use crate::pipeline::{ApplyOptions, ApplyOutcome};

/// Final state of one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub account_id: String,
    /// `None` only when the store was too broken to open a run log.
    pub run_log_id: Option<DbId>,
    pub status: RunStatus,
    pub summary: CycleSummary,
}

/// Mutable state threaded through a cycle so the failure path can persist
/// partial counters.
struct CycleState {
    run_log_id: Option<DbId>,
    dry_run: bool,
    summary: CycleSummary,
}

impl Automation {
    /// Run one cycle for `account_id` while holding its lock.
    pub async fn run_scheduler_cycle(&self, account_id: &str, trigger: RunTrigger) -> CycleReport {
        tracing::info!(account_id, trigger = %trigger, "Scheduler cycle started");

        let mut state = CycleState {
            run_log_id: None,
            dry_run: true,
            summary: CycleSummary::default(),
        };

        let (lease, result) = match self.store.lock_account(account_id).await {
            Ok(lease) => {
                let result = self.run_cycle(account_id, trigger, &mut state).await;
                (Some(lease), result)
            }
            Err(e) => (None, Err(e)),
        };
        let report = match result {
            Ok(report) => report,
            Err(e) => self.fail_cycle(account_id, trigger, state, &e.to_string()).await,
        };
        drop(lease);

        tracing::info!(
            account_id,
            status = %report.status,
            applied = report.summary.applied,
            simulated = report.summary.simulated,
            blocked = report.summary.blocked,
            failed = report.summary.failed,
            "Scheduler cycle finished"
        );
        report
    }

    async fn run_cycle(
        &self,
        account_id: &str,
        trigger: RunTrigger,
        state: &mut CycleState,
    ) -> Result<CycleReport, EngineError> {
        let policy = self.load_policy(account_id).await?;
        state.dry_run = self.effective_dry_run(&policy);

        if !policy.scheduler_enabled {
            let run = self
                .store
                .create_run_log(account_id, trigger.as_str(), state.dry_run, RunStatus::Skipped.as_str())
                .await?;
            state.run_log_id = Some(run.id);
            tracing::info!(account_id, "Scheduler disabled, cycle skipped");
            return self.finish(account_id, state, RunStatus::Skipped).await;
        }

        let run = self
            .store
            .create_run_log(account_id, trigger.as_str(), state.dry_run, RunStatus::Success.as_str())
            .await?;
        state.run_log_id = Some(run.id);

        if policy.auto_generate_recommendations {
            if let Err(e) = self.generate(&policy, state).await {
                let message = e.to_string();
                let alert = AlertEvent::new(
                    EVENT_GENERATION_FAILED,
                    AlertSeverity::Critical,
                    account_id,
                    message.clone(),
                );
                self.alert(&alert, &mut state.summary).await;
                state.summary.error = Some(message);
                return self.finish(account_id, state, RunStatus::Failed).await;
            }
        }

        if policy.auto_approval_enabled() {
            self.auto_approve(&policy, &mut state.summary).await?;
        }

        self.apply_approved(&policy, &mut state.summary).await?;

        let status = if state.summary.failed > 0 {
            RunStatus::Failed
        } else {
            RunStatus::Success
        };
        self.finish(account_id, state, status).await
    }

    /// Run the generator and alert on new critical recommendations.
    async fn generate(
        &self,
        policy: &AutomationPolicy,
        state: &mut CycleState,
    ) -> Result<(), EngineError> {
        let report = self.generator.generate(policy).await?;
        state.summary.generated = report.generated;
        state.summary.critical_recommendations_generated = report.critical.len() as u32;
        state.summary.trend_data_available = report.trend_data_available;

        for rec in report.critical.iter().take(MAX_CRITICAL_ALERTS_PER_RUN) {
            let alert = AlertEvent::new(
                EVENT_CRITICAL_RECOMMENDATION,
                AlertSeverity::Critical,
                &policy.account_id,
                format!(
                    "Critical recommendation: {} on {} {} ({})",
                    rec.action_type,
                    rec.entity_type,
                    rec.entity_id,
                    rec.evidence_digest()
                ),
            )
            .with_entity(&rec.entity_type, &rec.entity_id, rec.entity_name.clone())
            .with_rule(&rec.rule_key, rec.evidence.clone());
            self.alert(&alert, &mut state.summary).await;
        }
        Ok(())
    }

    /// Approve allow-listed, non-critical, executable queued recommendations.
    async fn auto_approve(
        &self,
        policy: &AutomationPolicy,
        summary: &mut CycleSummary,
    ) -> Result<(), EngineError> {
        let queued = self
            .store
            .list_executable_by_status(&policy.account_id, RecommendationStatus::Queued, None)
            .await?;

        for rec in queued {
            if !policy.is_auto_approvable(&rec.status, &rec.rule_key, &rec.severity, &rec.action_type) {
                continue;
            }
            let approved = self
                .store
                .transition_recommendation(
                    rec.id,
                    RecommendationStatus::Queued,
                    RecommendationStatus::Approved,
                )
                .await?;
            if approved {
                summary.auto_approved += 1;
                tracing::info!(
                    recommendation_id = rec.id,
                    rule_key = %rec.rule_key,
                    "Recommendation auto-approved"
                );
            }
        }
        Ok(())
    }

    /// Apply approved recommendations oldest first, one at a time.
    async fn apply_approved(
        &self,
        policy: &AutomationPolicy,
        summary: &mut CycleSummary,
    ) -> Result<(), EngineError> {
        let approved = self
            .store
            .list_executable_by_status(
                &policy.account_id,
                RecommendationStatus::Approved,
                Some(policy.apply_cap()),
            )
            .await?;

        for rec in approved {
            let outcome = self
                .apply_locked(&policy.account_id, rec.id, ApplyOptions::rule_engine(), Some(policy))
                .await?;
            match outcome {
                ApplyOutcome::Applied { simulated, .. } => {
                    summary.applied += 1;
                    if simulated {
                        summary.simulated += 1;
                    }
                }
                ApplyOutcome::Blocked { .. } => summary.blocked += 1,
                ApplyOutcome::Failed { error, .. } => {
                    summary.failed += 1;
                    summary.record_error(error);
                }
                ApplyOutcome::Skipped { .. } => summary.skipped += 1,
            }
        }
        Ok(())
    }

    async fn alert(&self, event: &AlertEvent, summary: &mut CycleSummary) {
        if self.alerter.send_alert(event).await {
            summary.alerts_sent += 1;
        } else {
            tracing::warn!(
                event_type = %event.event_type,
                account_id = %event.account_id,
                "Alert not delivered"
            );
        }
    }

    /// Persist the outcome on the run log and the settings snapshot.
    async fn finish(
        &self,
        account_id: &str,
        state: &CycleState,
        status: RunStatus,
    ) -> Result<CycleReport, EngineError> {
        let summary_json = state.summary.to_json();
        if let Some(id) = state.run_log_id {
            self.store.finish_run_log(id, status.as_str(), &summary_json).await?;
        }
        self.store
            .record_last_run(account_id, Utc::now(), status.as_str(), &summary_json)
            .await?;

        Ok(CycleReport {
            account_id: account_id.to_string(),
            run_log_id: state.run_log_id,
            status,
            summary: state.summary.clone(),
        })
    }

    /// Failure path for unexpected errors. Best effort: persistence errors
    /// here are logged and swallowed.
    async fn fail_cycle(
        &self,
        account_id: &str,
        trigger: RunTrigger,
        mut state: CycleState,
        error: &str,
    ) -> CycleReport {
        tracing::error!(account_id, error, "Scheduler cycle failed");
        state.summary.error = Some(error.to_string());

        let alert = AlertEvent::new(
            EVENT_SCHEDULER_FAILED,
            AlertSeverity::Critical,
            account_id,
            format!("Scheduler cycle failed: {error}"),
        );
        self.alert(&alert, &mut state.summary).await;

        if state.run_log_id.is_none() {
            match self
                .store
                .create_run_log(account_id, trigger.as_str(), state.dry_run, RunStatus::Failed.as_str())
                .await
            {
                Ok(run) => state.run_log_id = Some(run.id),
                Err(e) => tracing::error!(account_id, error = %e, "Could not open failed run log"),
            }
        }

        let summary_json = state.summary.to_json();
        if let Some(id) = state.run_log_id {
            if let Err(e) = self
                .store
                .finish_run_log(id, RunStatus::Failed.as_str(), &summary_json)
                .await
            {
                tracing::error!(account_id, run_log_id = id, error = %e, "Could not finalize run log");
            }
        }
        if let Err(e) = self
            .store
            .record_last_run(account_id, Utc::now(), RunStatus::Failed.as_str(), &summary_json)
            .await
        {
            tracing::error!(account_id, error = %e, "Could not record last run");
        }

        CycleReport {
            account_id: account_id.to_string(),
            run_log_id: state.run_log_id,
            status: RunStatus::Failed,
            summary: state.summary,
        }
    }
}
