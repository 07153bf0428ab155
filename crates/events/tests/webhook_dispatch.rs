//! Webhook channel tests against a wiremock endpoint.

use std::time::Duration;

use adpilot_core::alert::{AlertEvent, AlertSeverity, EVENT_CRITICAL_RECOMMENDATION};
use adpilot_events::{AlertDispatcher, Alerter, WebhookDelivery};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_delivery() -> WebhookDelivery {
    WebhookDelivery::new().with_retry_delays(vec![
        Duration::from_millis(5),
        Duration::from_millis(5),
        Duration::from_millis(5),
    ])
}

fn critical_event() -> AlertEvent {
    AlertEvent::new(
        EVENT_CRITICAL_RECOMMENDATION,
        AlertSeverity::Critical,
        "act_1",
        "Campaign spent $42 with zero leads",
    )
    .with_entity("campaign", "c1", Some("Spring Sale".to_string()))
    .with_rule("zero_leads", serde_json::json!({ "spend": 42, "leads": 0 }))
}

#[tokio::test]
async fn alert_is_posted_as_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hooks/alerts"))
        .and(body_partial_json(serde_json::json!({
            "event_type": "automation.critical_recommendation",
            "severity": "critical",
            "account_id": "act_1",
            "rule_key": "zero_leads",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher =
        AlertDispatcher::with_webhook(fast_delivery(), format!("{}/hooks/alerts", server.uri()));
    assert!(dispatcher.send_alert(&critical_event()).await);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hooks/alerts"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/hooks/alerts"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher =
        AlertDispatcher::with_webhook(fast_delivery(), format!("{}/hooks/alerts", server.uri()));
    assert!(dispatcher.send_alert(&critical_event()).await);
}

#[tokio::test]
async fn persistent_failure_reports_not_delivered_after_four_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hooks/alerts"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&server)
        .await;

    let dispatcher =
        AlertDispatcher::with_webhook(fast_delivery(), format!("{}/hooks/alerts", server.uri()));
    assert!(!dispatcher.send_alert(&critical_event()).await);
}
