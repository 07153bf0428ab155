//! Alert delivery via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport to send
//! plain-text alert emails. If `SMTP_HOST` or `ALERT_EMAIL_TO` is unset,
//! [`EmailConfig::from_env`] returns `None` and the channel is disabled.

use adpilot_core::alert::AlertEvent;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "alerts@adpilot.local";

/// Configuration for the SMTP alert channel.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    /// Recipient of every alert.
    pub to_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable         | Required | Default                |
    /// |------------------|----------|------------------------|
    /// | `SMTP_HOST`      | yes      |                        |
    /// | `ALERT_EMAIL_TO` | yes      |                        |
    /// | `SMTP_PORT`      | no       | `587`                  |
    /// | `SMTP_FROM`      | no       | `alerts@adpilot.local` |
    /// | `SMTP_USER`      | no       |                        |
    /// | `SMTP_PASSWORD`  | no       |                        |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        let to_address = std::env::var("ALERT_EMAIL_TO").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            to_address,
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

/// Sends alert emails via SMTP.
pub struct EmailDelivery {
    config: EmailConfig,
}

impl EmailDelivery {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn recipient(&self) -> &str {
        &self.config.to_address
    }

    /// Send an alert email to the configured recipient.
    pub async fn deliver(&self, event: &AlertEvent) -> Result<(), EmailError> {
        use lettre::{
            transport::smtp::authentication::Credentials, AsyncSmtpTransport, AsyncTransport,
            Tokio1Executor,
        };

        let email = build_message(&self.config, event)?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        tracing::info!(
            to = %self.config.to_address,
            event_type = %event.event_type,
            "Alert email sent"
        );
        Ok(())
    }
}

/// Assemble the plain-text alert message.
fn build_message(config: &EmailConfig, event: &AlertEvent) -> Result<lettre::Message, EmailError> {
    use lettre::message::header::ContentType;

    let subject = format!(
        "[adpilot] [{}] {} ({})",
        event.severity, event.event_type, event.account_id
    );
    let body = email_body(event);

    lettre::Message::builder()
        .from(config.from_address.parse()?)
        .to(config.to_address.parse()?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .map_err(|e| EmailError::Build(e.to_string()))
}

fn email_body(event: &AlertEvent) -> String {
    let mut lines = vec![
        format!("Event: {}", event.event_type),
        format!("Severity: {}", event.severity),
        format!("Account: {}", event.account_id),
        format!("Time: {}", event.timestamp.to_rfc3339()),
    ];
    if let (Some(entity_type), Some(entity_id)) = (&event.entity_type, &event.entity_id) {
        let name = event.entity_name.as_deref().unwrap_or("-");
        lines.push(format!("Entity: {entity_type} {entity_id} ({name})"));
    }
    if let Some(rule_key) = &event.rule_key {
        lines.push(format!("Rule: {rule_key}"));
    }
    lines.push(String::new());
    lines.push(event.message.clone());
    if let Some(evidence) = &event.evidence {
        lines.push(String::new());
        lines.push(serde_json::to_string_pretty(evidence).unwrap_or_default());
    }
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
