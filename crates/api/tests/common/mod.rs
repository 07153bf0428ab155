#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use adpilot_api::config::ServerConfig;
use adpilot_api::router::build_app_router;
use adpilot_api::state::AppState;
use adpilot_core::alert::AlertEvent;
use adpilot_db::models::recommendation::{CreateRecommendation, Recommendation};
use adpilot_engine::{Automation, AutomationStore, EngineConfig, MemoryStore};
use adpilot_events::Alerter;
use adpilot_meta::{AdPlatform, EntityBudget, EntityStatus, MetaApiError};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const ACCOUNT: &str = "act_1";

/// Platform double that records calls and always succeeds.
#[derive(Default)]
pub struct FakePlatform {
    calls: Mutex<Vec<String>>,
}

impl FakePlatform {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AdPlatform for FakePlatform {
    async fn set_status(&self, entity_id: &str, status: EntityStatus) -> Result<Value, MetaApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("set_status {entity_id} {}", status.as_str()));
        Ok(json!({ "success": true }))
    }

    async fn get_budget(&self, _entity_id: &str) -> Result<EntityBudget, MetaApiError> {
        Ok(EntityBudget {
            daily_budget: Some(1000),
            lifetime_budget: None,
        })
    }

    async fn set_daily_budget(&self, entity_id: &str, cents: i64) -> Result<Value, MetaApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("set_daily_budget {entity_id} {cents}"));
        Ok(json!({ "success": true }))
    }
}

/// Alerter that accepts everything.
pub struct NullAlerter;

#[async_trait]
impl Alerter for NullAlerter {
    async fn send_alert(&self, _event: &AlertEvent) -> bool {
        true
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// The app under test plus handles on its collaborators.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub platform: Arc<FakePlatform>,
}

/// Build the full application router over an in-memory store, with the
/// engine in live integration mode.
pub fn build_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let platform = Arc::new(FakePlatform::default());
    let automation = Automation::new(
        store.clone() as Arc<dyn AutomationStore>,
        platform.clone() as Arc<dyn AdPlatform>,
        Arc::new(NullAlerter),
        EngineConfig::live(),
    );
    let router = build_app_router(AppState::new(automation, test_config()));
    TestApp {
        router,
        store,
        platform,
    }
}

/// Seed an approved pause on campaign `c1`.
pub async fn seed_recommendation(store: &MemoryStore, status: &str) -> Recommendation {
    store
        .create_recommendation(&CreateRecommendation {
            account_id: ACCOUNT.to_string(),
            entity_type: "campaign".to_string(),
            entity_id: "c1".to_string(),
            entity_name: Some("Spring Sale".to_string()),
            campaign_id: None,
            action_type: "pause".to_string(),
            action_payload: None,
            rule_key: "zero_leads".to_string(),
            severity: Some("low".to_string()),
            confidence: Some(0.8),
            evidence: Some(json!({ "spend": 42, "leads": 0 })),
            status: Some(status.to_string()),
        })
        .await
        .unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri, None).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
