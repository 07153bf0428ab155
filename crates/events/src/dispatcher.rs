//! Fan-out of alerts to every configured channel.

use adpilot_core::alert::AlertEvent;
use async_trait::async_trait;

use crate::delivery::email::{EmailConfig, EmailDelivery};
use crate::delivery::webhook::WebhookDelivery;
use crate::Alerter;

/// Which alert channels are enabled.
#[derive(Debug, Clone, Default)]
pub struct AlertConfig {
    pub webhook_url: Option<String>,
    pub email: Option<EmailConfig>,
}

impl AlertConfig {
    /// Load from `ALERT_WEBHOOK_URL` and the SMTP variables read by
    /// [`EmailConfig::from_env`]. Empty values disable a channel.
    pub fn from_env() -> Self {
        Self {
            webhook_url: std::env::var("ALERT_WEBHOOK_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            email: EmailConfig::from_env(),
        }
    }
}

/// Sends each alert to the webhook and email channels.
///
/// With no channel configured, alerts are only logged and reported as not
/// delivered.
pub struct AlertDispatcher {
    webhook: Option<(WebhookDelivery, String)>,
    email: Option<EmailDelivery>,
}

impl AlertDispatcher {
    pub fn new(config: AlertConfig) -> Self {
        Self {
            webhook: config
                .webhook_url
                .map(|url| (WebhookDelivery::new(), url)),
            email: config.email.map(EmailDelivery::new),
        }
    }

    /// Dispatcher with only the webhook channel, using a given delivery.
    pub fn with_webhook(delivery: WebhookDelivery, url: impl Into<String>) -> Self {
        Self {
            webhook: Some((delivery, url.into())),
            email: None,
        }
    }

    /// Dispatcher that only logs.
    pub fn log_only() -> Self {
        Self {
            webhook: None,
            email: None,
        }
    }

    pub fn has_channels(&self) -> bool {
        self.webhook.is_some() || self.email.is_some()
    }
}

#[async_trait]
impl Alerter for AlertDispatcher {
    async fn send_alert(&self, event: &AlertEvent) -> bool {
        if !self.has_channels() {
            tracing::warn!(
                event_type = %event.event_type,
                severity = %event.severity,
                account_id = %event.account_id,
                message = %event.message,
                "No alert channel configured, alert logged only"
            );
            return false;
        }

        let mut delivered = false;

        if let Some((delivery, url)) = &self.webhook {
            match delivery.deliver(url, event).await {
                Ok(()) => delivered = true,
                Err(e) => tracing::error!(
                    event_type = %event.event_type,
                    account_id = %event.account_id,
                    error = %e,
                    "Alert webhook delivery failed"
                ),
            }
        }

        if let Some(email) = &self.email {
            match email.deliver(event).await {
                Ok(()) => delivered = true,
                Err(e) => tracing::error!(
                    event_type = %event.event_type,
                    account_id = %event.account_id,
                    to = email.recipient(),
                    error = %e,
                    "Alert email delivery failed"
                ),
            }
        }

        tracing::info!(
            event_type = %event.event_type,
            account_id = %event.account_id,
            delivered,
            "Alert dispatched"
        );
        delivered
    }
}
