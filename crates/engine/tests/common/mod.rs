//! Shared fixtures for engine integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use adpilot_core::alert::AlertEvent;
use adpilot_core::settings::AutomationPolicy;
use adpilot_db::models::action_log::{ActionLog, CreateActionLog};
use adpilot_db::models::automation_settings::UpsertAutomationSettings;
use adpilot_db::models::recommendation::{CreateRecommendation, Recommendation};
use adpilot_engine::{
    Automation, AutomationStore, EngineConfig, EngineError, GenerationReport, MemoryStore,
    RecommendationGenerator,
};
use adpilot_events::Alerter;
use adpilot_meta::{AdPlatform, EntityBudget, EntityStatus, MetaApiError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

pub const ACCOUNT: &str = "act_1";

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// Records every call; optionally fails them all or answers slowly.
#[derive(Default)]
pub struct FakePlatform {
    calls: Mutex<Vec<String>>,
    budget: Mutex<EntityBudget>,
    failure: Mutex<Option<String>>,
    latency: Mutex<Option<Duration>>,
}

impl FakePlatform {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_budget(&self, daily: Option<i64>, lifetime: Option<i64>) {
        *self.budget.lock().unwrap() = EntityBudget {
            daily_budget: daily,
            lifetime_budget: lifetime,
        };
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    /// Make every call sleep first, yielding to other tasks.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    async fn respond_slowly(&self) {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn record(&self, call: String) -> Result<(), MetaApiError> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(MetaApiError::Api { message, code: 100 }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AdPlatform for FakePlatform {
    async fn set_status(&self, entity_id: &str, status: EntityStatus) -> Result<Value, MetaApiError> {
        self.respond_slowly().await;
        self.record(format!("set_status {entity_id} {}", status.as_str()))?;
        Ok(json!({ "success": true }))
    }

    async fn get_budget(&self, entity_id: &str) -> Result<EntityBudget, MetaApiError> {
        self.respond_slowly().await;
        self.record(format!("get_budget {entity_id}"))?;
        Ok(*self.budget.lock().unwrap())
    }

    async fn set_daily_budget(&self, entity_id: &str, cents: i64) -> Result<Value, MetaApiError> {
        self.respond_slowly().await;
        self.record(format!("set_daily_budget {entity_id} {cents}"))?;
        Ok(json!({ "success": true }))
    }
}

// ---------------------------------------------------------------------------
// Alerter
// ---------------------------------------------------------------------------

pub struct RecordingAlerter {
    events: Mutex<Vec<AlertEvent>>,
    deliver: bool,
}

impl RecordingAlerter {
    pub fn new(deliver: bool) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            deliver,
        }
    }

    pub fn events(&self) -> Vec<AlertEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl Alerter for RecordingAlerter {
    async fn send_alert(&self, event: &AlertEvent) -> bool {
        self.events.lock().unwrap().push(event.clone());
        self.deliver
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

pub struct StaticGenerator(pub GenerationReport);

#[async_trait]
impl RecommendationGenerator for StaticGenerator {
    async fn generate(&self, _policy: &AutomationPolicy) -> Result<GenerationReport, EngineError> {
        Ok(self.0.clone())
    }
}

pub struct FailingGenerator;

#[async_trait]
impl RecommendationGenerator for FailingGenerator {
    async fn generate(&self, _policy: &AutomationPolicy) -> Result<GenerationReport, EngineError> {
        Err(EngineError::Generation("insights API unavailable".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub platform: Arc<FakePlatform>,
    pub alerter: Arc<RecordingAlerter>,
    pub automation: Automation,
    config: EngineConfig,
}

impl Harness {
    /// Live integration mode, so the account's dry-run flag decides.
    pub fn live() -> Self {
        Self::build(EngineConfig::live(), true)
    }

    pub fn mock() -> Self {
        Self::build(EngineConfig::mock(), true)
    }

    /// Live mode with an alerter that never delivers.
    pub fn with_undeliverable_alerts() -> Self {
        Self::build(EngineConfig::live(), false)
    }

    fn build(config: EngineConfig, deliver_alerts: bool) -> Self {
        let store = Arc::new(MemoryStore::new());
        let platform = Arc::new(FakePlatform::default());
        let alerter = Arc::new(RecordingAlerter::new(deliver_alerts));
        let automation = Automation::new(
            store.clone() as Arc<dyn AutomationStore>,
            platform.clone() as Arc<dyn AdPlatform>,
            alerter.clone() as Arc<dyn Alerter>,
            config,
        );
        Self {
            store,
            platform,
            alerter,
            automation,
            config,
        }
    }

    /// A separate engine over the same store and platform, as a second
    /// process (API server next to the worker) would have.
    pub fn second_engine(&self) -> Automation {
        Automation::new(
            self.store.clone() as Arc<dyn AutomationStore>,
            self.platform.clone() as Arc<dyn AdPlatform>,
            self.alerter.clone() as Arc<dyn Alerter>,
            self.config,
        )
    }

    pub fn with_generator(mut self, generator: impl RecommendationGenerator + 'static) -> Self {
        self.automation = self.automation.with_generator(Arc::new(generator));
        self
    }

    pub async fn settings(&self, dto: UpsertAutomationSettings) {
        self.store.upsert_settings(ACCOUNT, &dto).await.unwrap();
    }

    pub async fn recommendation(&self, edit: impl FnOnce(&mut CreateRecommendation)) -> Recommendation {
        let mut input = approved_pause();
        edit(&mut input);
        self.store.create_recommendation(&input).await.unwrap()
    }

    pub async fn reload(&self, id: i64) -> Recommendation {
        self.store.get_recommendation(id).await.unwrap().unwrap()
    }

    pub async fn logs(&self) -> Vec<ActionLog> {
        self.store.action_logs().await
    }

    /// Seed a prior action log for campaign `c1` at `at`.
    pub async fn prior_action(&self, status: &str, at: DateTime<Utc>) {
        let input = CreateActionLog {
            recommendation_id: None,
            account_id: ACCOUNT.to_string(),
            entity_type: "campaign".to_string(),
            entity_id: "c1".to_string(),
            entity_name: None,
            action_type: "pause".to_string(),
            action_payload: json!({}),
            mode: "manual".to_string(),
            triggered_by: "user".to_string(),
            dry_run: true,
            status: status.to_string(),
            message: "seeded".to_string(),
            meta_response: None,
        };
        self.store.insert_action_log_at(&input, at).await;
    }
}

/// Approved pause on campaign `c1` from the `zero_leads` rule.
pub fn approved_pause() -> CreateRecommendation {
    CreateRecommendation {
        account_id: ACCOUNT.to_string(),
        entity_type: "campaign".to_string(),
        entity_id: "c1".to_string(),
        entity_name: Some("Spring Sale".to_string()),
        campaign_id: None,
        action_type: "pause".to_string(),
        action_payload: None,
        rule_key: "zero_leads".to_string(),
        severity: Some("low".to_string()),
        confidence: Some(0.9),
        evidence: Some(json!({ "spend": 42, "leads": 0, "cpl": 100 })),
        status: Some("approved".to_string()),
    }
}

/// Settings for a live account with the scheduler on.
pub fn live_settings() -> UpsertAutomationSettings {
    UpsertAutomationSettings {
        dry_run: Some(false),
        scheduler_enabled: Some(true),
        max_applies_per_run: Some(5),
        ..Default::default()
    }
}

/// Settings for a dry-run account with the scheduler on.
pub fn dry_run_settings() -> UpsertAutomationSettings {
    UpsertAutomationSettings {
        dry_run: Some(true),
        scheduler_enabled: Some(true),
        max_applies_per_run: Some(5),
        auto_approve_low_risk: Some(false),
        ..Default::default()
    }
}
