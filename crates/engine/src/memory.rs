//! In-memory [`AutomationStore`].
//!
//! Mirrors the Postgres semantics (column defaults, compare-and-set
//! transitions, ordering, page-size clamps) so the engine and the HTTP
//! surface can run without a database.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use adpilot_core::recommendation::{is_executable_literal, RecommendationStatus};
use adpilot_core::types::{DbId, Timestamp};
use adpilot_db::models::action_log::{ActionLog, ActionLogQuery, CreateActionLog};
use adpilot_db::models::automation_settings::{AutomationSettings, UpsertAutomationSettings};
use adpilot_db::models::recommendation::{
    CreateRecommendation, Recommendation, RecommendationListQuery,
};
use adpilot_db::models::scheduler_run_log::SchedulerRunLog;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::EngineError;
use crate::lock::{AccountLease, AccountLocks};
use crate::store::AutomationStore;

#[derive(Default)]
struct Tables {
    recommendations: BTreeMap<DbId, Recommendation>,
    settings: HashMap<String, AutomationSettings>,
    action_logs: Vec<ActionLog>,
    run_logs: Vec<SchedulerRunLog>,
    next_id: DbId,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store backed by a mutex-guarded set of tables.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    locks: AccountLocks,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail, as a lost database would.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), EngineError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(EngineError::Store("store unavailable".to_string()));
        }
        Ok(())
    }

    /// Append an action log with an explicit creation time.
    pub async fn insert_action_log_at(&self, input: &CreateActionLog, created_at: Timestamp) -> ActionLog {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        let log = action_log_row(id, input, created_at);
        tables.action_logs.push(log.clone());
        log
    }

    /// Snapshot of every action log, oldest first.
    pub async fn action_logs(&self) -> Vec<ActionLog> {
        self.tables.lock().await.action_logs.clone()
    }

    /// Snapshot of every run log, oldest first.
    pub async fn run_logs(&self) -> Vec<SchedulerRunLog> {
        self.tables.lock().await.run_logs.clone()
    }
}

fn action_log_row(id: DbId, input: &CreateActionLog, created_at: Timestamp) -> ActionLog {
    ActionLog {
        id,
        recommendation_id: input.recommendation_id,
        account_id: input.account_id.clone(),
        entity_type: input.entity_type.clone(),
        entity_id: input.entity_id.clone(),
        entity_name: input.entity_name.clone(),
        action_type: input.action_type.clone(),
        action_payload: input.action_payload.clone(),
        mode: input.mode.clone(),
        triggered_by: input.triggered_by.clone(),
        dry_run: input.dry_run,
        status: input.status.clone(),
        message: input.message.clone(),
        meta_response: input.meta_response.clone(),
        created_at,
    }
}

/// Row with the same defaults as the `automation_settings` table.
fn default_settings(account_id: &str, now: Timestamp) -> AutomationSettings {
    AutomationSettings {
        account_id: account_id.to_string(),
        mode: "manual".to_string(),
        dry_run: true,
        scheduler_enabled: false,
        auto_generate_recommendations: false,
        auto_approve_low_risk: false,
        allowed_auto_approve_rule_keys: Vec::new(),
        protected_campaign_ids: Vec::new(),
        action_cooldown_minutes: 0,
        max_actions_per_entity_per_day: 0,
        max_applies_per_run: 5,
        last_scheduler_run_at: None,
        last_scheduler_run_status: None,
        last_scheduler_run_summary: None,
        created_at: now,
        updated_at: now,
    }
}

fn page(limit: Option<i64>, offset: Option<i64>, default: i64, max: i64) -> (usize, usize) {
    let limit = limit.unwrap_or(default).clamp(1, max) as usize;
    let offset = offset.unwrap_or(0).max(0) as usize;
    (limit, offset)
}

#[async_trait]
impl AutomationStore for MemoryStore {
    async fn health_check(&self) -> Result<(), EngineError> {
        self.check_available()
    }

    async fn lock_account(&self, account_id: &str) -> Result<AccountLease, EngineError> {
        self.check_available()?;
        Ok(AccountLease::new(self.locks.acquire(account_id).await))
    }

    async fn create_recommendation(
        &self,
        input: &CreateRecommendation,
    ) -> Result<Recommendation, EngineError> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        let now = Utc::now();
        let rec = Recommendation {
            id,
            account_id: input.account_id.clone(),
            entity_type: input.entity_type.clone(),
            entity_id: input.entity_id.clone(),
            entity_name: input.entity_name.clone(),
            campaign_id: input.campaign_id.clone(),
            action_type: input.action_type.clone(),
            action_payload: input
                .action_payload
                .clone()
                .unwrap_or_else(|| serde_json::json!({})),
            rule_key: input.rule_key.clone(),
            severity: input.severity.clone().unwrap_or_else(|| "medium".to_string()),
            confidence: input.confidence,
            evidence: input.evidence.clone().unwrap_or_else(|| serde_json::json!({})),
            status: input
                .status
                .clone()
                .unwrap_or_else(|| RecommendationStatus::Queued.as_str().to_string()),
            approved_at: None,
            applied_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.recommendations.insert(id, rec.clone());
        Ok(rec)
    }

    async fn get_recommendation(&self, id: DbId) -> Result<Option<Recommendation>, EngineError> {
        self.check_available()?;
        Ok(self.tables.lock().await.recommendations.get(&id).cloned())
    }

    async fn list_recommendations(
        &self,
        account_id: &str,
        query: &RecommendationListQuery,
    ) -> Result<Vec<Recommendation>, EngineError> {
        self.check_available()?;
        let (limit, offset) = page(query.limit, query.offset, 50, 200);
        let tables = self.tables.lock().await;
        let mut rows: Vec<Recommendation> = tables
            .recommendations
            .values()
            .filter(|r| r.account_id == account_id)
            .filter(|r| query.status.as_deref().map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn list_executable_by_status(
        &self,
        account_id: &str,
        status: RecommendationStatus,
        limit: Option<u32>,
    ) -> Result<Vec<Recommendation>, EngineError> {
        self.check_available()?;
        let tables = self.tables.lock().await;
        let mut rows: Vec<Recommendation> = tables
            .recommendations
            .values()
            .filter(|r| r.account_id == account_id && r.status == status.as_str())
            .filter(|r| is_executable_literal(&r.action_type))
            .cloned()
            .collect();
        rows.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        if let Some(limit) = limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn transition_recommendation(
        &self,
        id: DbId,
        expected: RecommendationStatus,
        next: RecommendationStatus,
    ) -> Result<bool, EngineError> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        let Some(rec) = tables.recommendations.get_mut(&id) else {
            return Ok(false);
        };
        if rec.status != expected.as_str() {
            return Ok(false);
        }
        let now = Utc::now();
        rec.status = next.as_str().to_string();
        match next {
            RecommendationStatus::Approved => rec.approved_at = Some(now),
            RecommendationStatus::Applied => rec.applied_at = Some(now),
            _ => {}
        }
        rec.updated_at = now;
        Ok(true)
    }

    async fn get_settings(
        &self,
        account_id: &str,
    ) -> Result<Option<AutomationSettings>, EngineError> {
        self.check_available()?;
        Ok(self.tables.lock().await.settings.get(account_id).cloned())
    }

    async fn upsert_settings(
        &self,
        account_id: &str,
        input: &UpsertAutomationSettings,
    ) -> Result<AutomationSettings, EngineError> {
        self.check_available()?;
        let now = Utc::now();
        let mut tables = self.tables.lock().await;
        let row = tables
            .settings
            .entry(account_id.to_string())
            .or_insert_with(|| default_settings(account_id, now));

        if let Some(mode) = &input.mode {
            row.mode = mode.clone();
        }
        if let Some(v) = input.dry_run {
            row.dry_run = v;
        }
        if let Some(v) = input.scheduler_enabled {
            row.scheduler_enabled = v;
        }
        if let Some(v) = input.auto_generate_recommendations {
            row.auto_generate_recommendations = v;
        }
        if let Some(v) = input.auto_approve_low_risk {
            row.auto_approve_low_risk = v;
        }
        if let Some(keys) = &input.allowed_auto_approve_rule_keys {
            row.allowed_auto_approve_rule_keys = keys.clone();
        }
        if let Some(ids) = &input.protected_campaign_ids {
            row.protected_campaign_ids = ids.clone();
        }
        if let Some(v) = input.action_cooldown_minutes {
            row.action_cooldown_minutes = v;
        }
        if let Some(v) = input.max_actions_per_entity_per_day {
            row.max_actions_per_entity_per_day = v;
        }
        if let Some(v) = input.max_applies_per_run {
            row.max_applies_per_run = v;
        }
        row.updated_at = now;
        Ok(row.clone())
    }

    async fn list_scheduler_enabled_accounts(&self) -> Result<Vec<String>, EngineError> {
        self.check_available()?;
        let tables = self.tables.lock().await;
        let mut accounts: Vec<String> = tables
            .settings
            .values()
            .filter(|s| s.scheduler_enabled)
            .map(|s| s.account_id.clone())
            .collect();
        accounts.sort();
        Ok(accounts)
    }

    async fn record_last_run(
        &self,
        account_id: &str,
        at: Timestamp,
        status: &str,
        summary: &serde_json::Value,
    ) -> Result<(), EngineError> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        if let Some(row) = tables.settings.get_mut(account_id) {
            row.last_scheduler_run_at = Some(at);
            row.last_scheduler_run_status = Some(status.to_string());
            row.last_scheduler_run_summary = Some(summary.clone());
        }
        Ok(())
    }

    async fn insert_action_log(&self, input: &CreateActionLog) -> Result<ActionLog, EngineError> {
        self.check_available()?;
        Ok(self.insert_action_log_at(input, Utc::now()).await)
    }

    async fn list_entity_action_logs_since(
        &self,
        account_id: &str,
        entity_type: &str,
        entity_id: &str,
        since: Timestamp,
    ) -> Result<Vec<ActionLog>, EngineError> {
        self.check_available()?;
        let tables = self.tables.lock().await;
        let mut rows: Vec<ActionLog> = tables
            .action_logs
            .iter()
            .filter(|l| {
                l.account_id == account_id
                    && l.entity_type == entity_type
                    && l.entity_id == entity_id
                    && l.created_at >= since
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows)
    }

    async fn list_action_logs(
        &self,
        account_id: &str,
        query: &ActionLogQuery,
    ) -> Result<Vec<ActionLog>, EngineError> {
        self.check_available()?;
        let (limit, offset) = page(query.limit, query.offset, 100, 500);
        let tables = self.tables.lock().await;
        let mut rows: Vec<ActionLog> = tables
            .action_logs
            .iter()
            .filter(|l| l.account_id == account_id)
            .filter(|l| {
                query
                    .recommendation_id
                    .map_or(true, |id| l.recommendation_id == Some(id))
            })
            .filter(|l| query.entity_id.as_deref().map_or(true, |e| l.entity_id == e))
            .filter(|l| query.status.as_deref().map_or(true, |s| l.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn create_run_log(
        &self,
        account_id: &str,
        trigger: &str,
        dry_run: bool,
        status: &str,
    ) -> Result<SchedulerRunLog, EngineError> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        let now = Utc::now();
        let run = SchedulerRunLog {
            id,
            account_id: account_id.to_string(),
            trigger: trigger.to_string(),
            dry_run,
            status: status.to_string(),
            summary: serde_json::json!({}),
            started_at: now,
            finished_at: None,
            created_at: now,
        };
        tables.run_logs.push(run.clone());
        Ok(run)
    }

    async fn finish_run_log(
        &self,
        id: DbId,
        status: &str,
        summary: &serde_json::Value,
    ) -> Result<(), EngineError> {
        self.check_available()?;
        let mut tables = self.tables.lock().await;
        if let Some(run) = tables.run_logs.iter_mut().find(|r| r.id == id) {
            run.status = status.to_string();
            run.summary = summary.clone();
            run.finished_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn list_run_logs(
        &self,
        account_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<SchedulerRunLog>, EngineError> {
        self.check_available()?;
        let (limit, _) = page(limit, None, 20, 100);
        let tables = self.tables.lock().await;
        let mut rows: Vec<SchedulerRunLog> = tables
            .run_logs
            .iter()
            .filter(|r| r.account_id == account_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.started_at, b.id).cmp(&(a.started_at, a.id)));
        rows.truncate(limit);
        Ok(rows)
    }
}
