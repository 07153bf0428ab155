//! Persistence seam for the engine.
//!
//! [`AutomationStore`] covers every read and write the pipeline, the
//! scheduler and the HTTP surface need. [`PgStore`] delegates to the
//! repositories in `adpilot-db`; [`crate::memory::MemoryStore`] keeps
//! everything in process.

use adpilot_core::recommendation::{executable_action_literals, RecommendationStatus};
use adpilot_core::types::{DbId, Timestamp};
use adpilot_db::models::action_log::{ActionLog, ActionLogQuery, CreateActionLog};
use adpilot_db::models::automation_settings::{AutomationSettings, UpsertAutomationSettings};
use adpilot_db::models::recommendation::{
    CreateRecommendation, Recommendation, RecommendationListQuery,
};
use adpilot_db::models::scheduler_run_log::SchedulerRunLog;
use adpilot_db::repositories::{
    AccountLockRepo, ActionLogRepo, AutomationSettingsRepo, RecommendationRepo,
    SchedulerRunLogRepo,
};
use adpilot_db::DbPool;
use async_trait::async_trait;

use crate::error::EngineError;
use crate::lock::AccountLease;

#[async_trait]
pub trait AutomationStore: Send + Sync {
    /// Cheap reachability probe for health checks.
    async fn health_check(&self) -> Result<(), EngineError>;

    /// Wait for the account's single-writer lock. Every store handle over
    /// the same data shares it, so separate engines (or processes) are
    /// serialised too.
    async fn lock_account(&self, account_id: &str) -> Result<AccountLease, EngineError>;

    // ---- recommendations ----

    async fn create_recommendation(
        &self,
        input: &CreateRecommendation,
    ) -> Result<Recommendation, EngineError>;

    async fn get_recommendation(&self, id: DbId) -> Result<Option<Recommendation>, EngineError>;

    /// Newest first, for listing.
    async fn list_recommendations(
        &self,
        account_id: &str,
        query: &RecommendationListQuery,
    ) -> Result<Vec<Recommendation>, EngineError>;

    /// Executable recommendations in `status`, oldest first.
    async fn list_executable_by_status(
        &self,
        account_id: &str,
        status: RecommendationStatus,
        limit: Option<u32>,
    ) -> Result<Vec<Recommendation>, EngineError>;

    /// Compare-and-set status update. `false` if the row moved on.
    async fn transition_recommendation(
        &self,
        id: DbId,
        expected: RecommendationStatus,
        next: RecommendationStatus,
    ) -> Result<bool, EngineError>;

    // ---- settings ----

    async fn get_settings(&self, account_id: &str)
        -> Result<Option<AutomationSettings>, EngineError>;

    async fn upsert_settings(
        &self,
        account_id: &str,
        input: &UpsertAutomationSettings,
    ) -> Result<AutomationSettings, EngineError>;

    async fn list_scheduler_enabled_accounts(&self) -> Result<Vec<String>, EngineError>;

    async fn record_last_run(
        &self,
        account_id: &str,
        at: Timestamp,
        status: &str,
        summary: &serde_json::Value,
    ) -> Result<(), EngineError>;

    // ---- action logs ----

    async fn insert_action_log(&self, input: &CreateActionLog) -> Result<ActionLog, EngineError>;

    /// Logs for one entity created at or after `since`.
    async fn list_entity_action_logs_since(
        &self,
        account_id: &str,
        entity_type: &str,
        entity_id: &str,
        since: Timestamp,
    ) -> Result<Vec<ActionLog>, EngineError>;

    async fn list_action_logs(
        &self,
        account_id: &str,
        query: &ActionLogQuery,
    ) -> Result<Vec<ActionLog>, EngineError>;

    // ---- scheduler run logs ----

    async fn create_run_log(
        &self,
        account_id: &str,
        trigger: &str,
        dry_run: bool,
        status: &str,
    ) -> Result<SchedulerRunLog, EngineError>;

    async fn finish_run_log(
        &self,
        id: DbId,
        status: &str,
        summary: &serde_json::Value,
    ) -> Result<(), EngineError>;

    async fn list_run_logs(
        &self,
        account_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<SchedulerRunLog>, EngineError>;
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AutomationStore for PgStore {
    async fn health_check(&self) -> Result<(), EngineError> {
        Ok(adpilot_db::health_check(&self.pool).await?)
    }

    async fn lock_account(&self, account_id: &str) -> Result<AccountLease, EngineError> {
        let tx = AccountLockRepo::acquire(&self.pool, account_id).await?;
        Ok(AccountLease::new(tx))
    }

    async fn create_recommendation(
        &self,
        input: &CreateRecommendation,
    ) -> Result<Recommendation, EngineError> {
        Ok(RecommendationRepo::create(&self.pool, input).await?)
    }

    async fn get_recommendation(&self, id: DbId) -> Result<Option<Recommendation>, EngineError> {
        Ok(RecommendationRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_recommendations(
        &self,
        account_id: &str,
        query: &RecommendationListQuery,
    ) -> Result<Vec<Recommendation>, EngineError> {
        Ok(RecommendationRepo::list_by_account(&self.pool, account_id, query).await?)
    }

    async fn list_executable_by_status(
        &self,
        account_id: &str,
        status: RecommendationStatus,
        limit: Option<u32>,
    ) -> Result<Vec<Recommendation>, EngineError> {
        Ok(RecommendationRepo::list_by_status_oldest_first(
            &self.pool,
            account_id,
            status.as_str(),
            &executable_action_literals(),
            limit.map(i64::from),
        )
        .await?)
    }

    async fn transition_recommendation(
        &self,
        id: DbId,
        expected: RecommendationStatus,
        next: RecommendationStatus,
    ) -> Result<bool, EngineError> {
        Ok(RecommendationRepo::transition(&self.pool, id, expected.as_str(), next.as_str()).await?)
    }

    async fn get_settings(
        &self,
        account_id: &str,
    ) -> Result<Option<AutomationSettings>, EngineError> {
        Ok(AutomationSettingsRepo::find(&self.pool, account_id).await?)
    }

    async fn upsert_settings(
        &self,
        account_id: &str,
        input: &UpsertAutomationSettings,
    ) -> Result<AutomationSettings, EngineError> {
        Ok(AutomationSettingsRepo::upsert(&self.pool, account_id, input).await?)
    }

    async fn list_scheduler_enabled_accounts(&self) -> Result<Vec<String>, EngineError> {
        Ok(AutomationSettingsRepo::list_scheduler_enabled_accounts(&self.pool).await?)
    }

    async fn record_last_run(
        &self,
        account_id: &str,
        at: Timestamp,
        status: &str,
        summary: &serde_json::Value,
    ) -> Result<(), EngineError> {
        Ok(AutomationSettingsRepo::record_last_run(&self.pool, account_id, at, status, summary).await?)
    }

    async fn insert_action_log(&self, input: &CreateActionLog) -> Result<ActionLog, EngineError> {
        Ok(ActionLogRepo::insert(&self.pool, input).await?)
    }

    async fn list_entity_action_logs_since(
        &self,
        account_id: &str,
        entity_type: &str,
        entity_id: &str,
        since: Timestamp,
    ) -> Result<Vec<ActionLog>, EngineError> {
        Ok(
            ActionLogRepo::list_for_entity_since(&self.pool, account_id, entity_type, entity_id, since)
                .await?,
        )
    }

    async fn list_action_logs(
        &self,
        account_id: &str,
        query: &ActionLogQuery,
    ) -> Result<Vec<ActionLog>, EngineError> {
        Ok(ActionLogRepo::list(&self.pool, account_id, query).await?)
    }

    async fn create_run_log(
        &self,
        account_id: &str,
        trigger: &str,
        dry_run: bool,
        status: &str,
    ) -> Result<SchedulerRunLog, EngineError> {
        Ok(SchedulerRunLogRepo::create(&self.pool, account_id, trigger, dry_run, status).await?)
    }

    async fn finish_run_log(
        &self,
        id: DbId,
        status: &str,
        summary: &serde_json::Value,
    ) -> Result<(), EngineError> {
        SchedulerRunLogRepo::finish(&self.pool, id, status, summary).await?;
        Ok(())
    }

    async fn list_run_logs(
        &self,
        account_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<SchedulerRunLog>, EngineError> {
        Ok(SchedulerRunLogRepo::list_by_account(&self.pool, account_id, limit).await?)
    }
}
