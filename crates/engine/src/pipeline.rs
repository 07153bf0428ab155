//! Apply pipeline: one recommendation, start to finish.
//!
//! Steps, short-circuiting on the first that does not pass:
//!
//! 1. load the recommendation (`not_found`)
//! 2. check the caller's account (`forbidden`)
//! 3. reject `false_positive` and anything not approved, unless a queued
//!    recommendation is explicitly forced (`bad_status`)
//! 4. reject informational actions (`non_executable`)
//! 5. load the account policy (fail-safe dry-run when none is stored)
//! 6. protection, cooldown and daily-cap guardrails (`blocked`, logged)
//! 7. execute, or simulate in mock mode
//! 8. write exactly one action log for the outcome
//! 9. transition the recommendation (`applied` / `failed`; simulated runs
//!    leave it untouched)
//!
//! Skips are caller errors and are not written to the audit log.

use adpilot_core::audit::{ActionLogStatus, TriggeredBy};
use adpilot_core::evidence::with_evidence;
use adpilot_core::guardrails::{
    check_cooldown, check_daily_cap, check_protected, cooldown_cutoff, start_of_day,
    GuardrailDecision, LoggedAction,
};
use adpilot_core::recommendation::{EntityRef, RecommendationStatus};
use adpilot_core::settings::AutomationPolicy;
use adpilot_core::types::DbId;
use adpilot_db::models::action_log::{ActionLog, CreateActionLog};
use adpilot_db::models::recommendation::Recommendation;
use chrono::Utc;
use serde::Serialize;

use crate::automation::Automation;
use crate::error::EngineError;
use crate::executor::{ExecutionRequest, ExecutionResult};

/// Who asked for the apply and whether a queued recommendation may skip
/// human approval.
#[derive(Debug, Clone, Copy)]
pub struct ApplyOptions {
    pub triggered_by: TriggeredBy,
    pub force_queued: bool,
}

impl ApplyOptions {
    pub fn user(force_queued: bool) -> Self {
        Self {
            triggered_by: TriggeredBy::User,
            force_queued,
        }
    }

    pub fn rule_engine() -> Self {
        Self {
            triggered_by: TriggeredBy::RuleEngine,
            force_queued: false,
        }
    }
}

/// Why a request was refused before any policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotFound,
    Forbidden,
    BadStatus,
    NonExecutable,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::BadStatus => "bad_status",
            Self::NonExecutable => "non_executable",
        }
    }
}

/// Result of one apply attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// Refused before policy evaluation. Nothing was written.
    Skipped { reason: SkipReason, message: String },
    /// A guardrail refused. Logged; the recommendation is untouched.
    Blocked { reason: String, action_log_id: DbId },
    /// The executor succeeded, for real or simulated.
    Applied {
        simulated: bool,
        message: String,
        action_log_id: DbId,
    },
    /// The executor failed. Logged; the recommendation is now `failed`.
    Failed { error: String, action_log_id: DbId },
}

impl ApplyOutcome {
    fn skipped(reason: SkipReason, message: impl Into<String>) -> Self {
        Self::Skipped {
            reason,
            message: message.into(),
        }
    }
}

/// Loaded and validated target of an apply.
struct ApplyTarget {
    rec: Recommendation,
    entity: EntityRef,
    status: RecommendationStatus,
}

impl Automation {
    /// Apply one recommendation on behalf of `account_id`.
    ///
    /// Holds the account lock for the duration of the attempt. Only store
    /// failures are returned as `Err`.
    pub async fn apply_recommendation(
        &self,
        account_id: &str,
        id: DbId,
        options: ApplyOptions,
    ) -> Result<ApplyOutcome, EngineError> {
        let _lease = self.store.lock_account(account_id).await?;
        self.apply_locked(account_id, id, options, None).await
    }

    /// Apply with the account lock already held.
    ///
    /// `policy` is the caller's snapshot; `None` loads it from the store.
    pub(crate) async fn apply_locked(
        &self,
        account_id: &str,
        id: DbId,
        options: ApplyOptions,
        policy: Option<&AutomationPolicy>,
    ) -> Result<ApplyOutcome, EngineError> {
        let target = match self.load_target(account_id, id, options).await? {
            Ok(target) => target,
            Err(skip) => {
                tracing::info!(
                    recommendation_id = id,
                    account_id,
                    outcome = ?skip,
                    "Apply skipped"
                );
                return Ok(skip);
            }
        };

        let loaded;
        let policy = match policy {
            Some(policy) => policy,
            None => {
                loaded = self.load_policy(account_id).await?;
                &loaded
            }
        };

        if let GuardrailDecision::Block { reason } = self.evaluate_guardrails(&target, policy).await? {
            let log = self
                .write_log(&target, policy, options, ActionLogStatus::Blocked, &reason, None)
                .await?;
            tracing::info!(
                recommendation_id = id,
                account_id,
                action_log_id = log.id,
                reason = %reason,
                "Apply blocked by guardrail"
            );
            return Ok(ApplyOutcome::Blocked {
                reason,
                action_log_id: log.id,
            });
        }

        let result = self.execute(&target, policy).await;
        self.record_result(&target, policy, options, result).await
    }

    /// Steps 1-4. The inner `Err` carries the skip outcome.
    async fn load_target(
        &self,
        account_id: &str,
        id: DbId,
        options: ApplyOptions,
    ) -> Result<Result<ApplyTarget, ApplyOutcome>, EngineError> {
        let Some(rec) = self.store.get_recommendation(id).await? else {
            return Ok(Err(ApplyOutcome::skipped(
                SkipReason::NotFound,
                format!("Recommendation {id} not found"),
            )));
        };

        if rec.account_id != account_id {
            return Ok(Err(ApplyOutcome::skipped(
                SkipReason::Forbidden,
                format!("Recommendation {id} does not belong to account {account_id}"),
            )));
        }

        let status = match rec.lifecycle_status() {
            Some(RecommendationStatus::FalsePositive) => {
                return Ok(Err(ApplyOutcome::skipped(
                    SkipReason::BadStatus,
                    format!("Recommendation {id} is marked false positive"),
                )))
            }
            Some(status @ RecommendationStatus::Approved) => status,
            Some(status @ RecommendationStatus::Queued) if options.force_queued => status,
            _ => {
                return Ok(Err(ApplyOutcome::skipped(
                    SkipReason::BadStatus,
                    format!(
                        "Recommendation {id} has status {}; only approved recommendations can be applied",
                        rec.status
                    ),
                )))
            }
        };

        if !rec.is_executable() {
            return Ok(Err(ApplyOutcome::skipped(
                SkipReason::NonExecutable,
                format!("Action {} is informational and cannot be applied", rec.action_type),
            )));
        }

        let entity = match rec.entity_ref() {
            Ok(entity) => entity,
            Err(e) => {
                return Ok(Err(ApplyOutcome::skipped(
                    SkipReason::NonExecutable,
                    e.to_string(),
                )))
            }
        };

        Ok(Ok(ApplyTarget {
            rec,
            entity,
            status,
        }))
    }

    /// Settings snapshot, or the fail-safe policy when none is stored.
    pub(crate) async fn load_policy(&self, account_id: &str) -> Result<AutomationPolicy, EngineError> {
        Ok(self
            .store
            .get_settings(account_id)
            .await?
            .map(|s| s.to_policy())
            .unwrap_or_else(|| AutomationPolicy::fail_safe(account_id)))
    }

    /// Mock mode forces simulation on top of the account's own dry-run flag.
    pub(crate) fn effective_dry_run(&self, policy: &AutomationPolicy) -> bool {
        self.config.mode.is_mock() || policy.dry_run
    }

    /// Protection first, then cooldown and daily cap against fresh logs.
    async fn evaluate_guardrails(
        &self,
        target: &ApplyTarget,
        policy: &AutomationPolicy,
    ) -> Result<GuardrailDecision, EngineError> {
        let decision = check_protected(&target.entity, policy);
        if !decision.is_allowed() {
            return Ok(decision);
        }

        let now = Utc::now();
        let entity_type = target.entity.entity_type();
        let entity_id = target.entity.id();
        let account_id = target.rec.account_id.as_str();

        let (recent, todays) = tokio::try_join!(
            self.store.list_entity_action_logs_since(
                account_id,
                entity_type.as_str(),
                entity_id,
                cooldown_cutoff(policy, now),
            ),
            self.store.list_entity_action_logs_since(
                account_id,
                entity_type.as_str(),
                entity_id,
                start_of_day(now),
            ),
        )?;
        let recent = logged_actions(&recent);
        let todays = logged_actions(&todays);

        let decision = check_cooldown(entity_type, entity_id, policy, &recent, now);
        if !decision.is_allowed() {
            return Ok(decision);
        }
        Ok(check_daily_cap(entity_type, entity_id, policy, &todays, now))
    }

    async fn execute(&self, target: &ApplyTarget, policy: &AutomationPolicy) -> ExecutionResult {
        let Some(action) = target.rec.action() else {
            return ExecutionResult::Failure {
                error: format!("Unknown action {}", target.rec.action_type),
            };
        };
        let request = ExecutionRequest {
            entity: &target.entity,
            entity_name: target.rec.entity_name.as_deref(),
            action,
            payload: &target.rec.action_payload,
            dry_run: policy.dry_run,
        };

        if self.config.mode.is_mock() {
            return ExecutionResult::mock(&request);
        }
        self.executor.execute(request).await
    }

    /// Steps 8 and 9.
    async fn record_result(
        &self,
        target: &ApplyTarget,
        policy: &AutomationPolicy,
        options: ApplyOptions,
        result: ExecutionResult,
    ) -> Result<ApplyOutcome, EngineError> {
        let id = target.rec.id;
        match result {
            ExecutionResult::Success {
                response_summary,
                simulated,
                response,
                ..
            } => {
                let status = if simulated {
                    ActionLogStatus::Simulated
                } else {
                    ActionLogStatus::Success
                };
                let meta_response = if simulated { None } else { response };
                let log = self
                    .write_log(target, policy, options, status, &response_summary, meta_response)
                    .await?;

                if !simulated {
                    self.move_status(target, RecommendationStatus::Applied).await?;
                }
                tracing::info!(
                    recommendation_id = id,
                    action_log_id = log.id,
                    simulated,
                    summary = %response_summary,
                    "Recommendation applied"
                );
                Ok(ApplyOutcome::Applied {
                    simulated,
                    message: log.message,
                    action_log_id: log.id,
                })
            }
            ExecutionResult::Failure { error } => {
                let log = self
                    .write_log(target, policy, options, ActionLogStatus::Failed, &error, None)
                    .await?;
                self.move_status(target, RecommendationStatus::Failed).await?;
                tracing::warn!(
                    recommendation_id = id,
                    action_log_id = log.id,
                    error = %error,
                    "Recommendation apply failed"
                );
                Ok(ApplyOutcome::Failed {
                    error,
                    action_log_id: log.id,
                })
            }
        }
    }

    async fn move_status(
        &self,
        target: &ApplyTarget,
        next: RecommendationStatus,
    ) -> Result<(), EngineError> {
        let moved = self
            .store
            .transition_recommendation(target.rec.id, target.status, next)
            .await?;
        if !moved {
            tracing::warn!(
                recommendation_id = target.rec.id,
                expected = %target.status,
                next = %next,
                "Recommendation status changed concurrently; transition not applied"
            );
        }
        Ok(())
    }

    async fn write_log(
        &self,
        target: &ApplyTarget,
        policy: &AutomationPolicy,
        options: ApplyOptions,
        status: ActionLogStatus,
        message: &str,
        meta_response: Option<serde_json::Value>,
    ) -> Result<ActionLog, EngineError> {
        let rec = &target.rec;
        let input = CreateActionLog {
            recommendation_id: Some(rec.id),
            account_id: rec.account_id.clone(),
            entity_type: rec.entity_type.clone(),
            entity_id: rec.entity_id.clone(),
            entity_name: rec.entity_name.clone(),
            action_type: rec.action_type.clone(),
            action_payload: rec.action_payload.clone(),
            mode: policy.mode.as_str().to_string(),
            triggered_by: options.triggered_by.as_str().to_string(),
            dry_run: self.effective_dry_run(policy),
            status: status.as_str().to_string(),
            message: with_evidence(message, &rec.evidence_digest()),
            meta_response,
        };
        self.store.insert_action_log(&input).await
    }
}

fn logged_actions(logs: &[ActionLog]) -> Vec<LoggedAction> {
    logs.iter().filter_map(ActionLog::as_logged_action).collect()
}
