//! Webhook delivery with exponential-backoff retry.
//!
//! [`WebhookDelivery`] sends a JSON-encoded [`AlertEvent`] to an external
//! URL via HTTP POST. Failed attempts are retried three times with
//! exponential backoff (1 s, 2 s, 4 s), followed by one final attempt.

use std::time::Duration;

use adpilot_core::alert::AlertEvent;

/// Retry delays (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// WebhookDelivery
// ---------------------------------------------------------------------------

/// Delivers alerts to an external webhook endpoint.
pub struct WebhookDelivery {
    client: reqwest::Client,
    retry_delays: Vec<Duration>,
}

impl WebhookDelivery {
    /// Create a new delivery service with a pre-configured HTTP client.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            retry_delays: RETRY_DELAYS.to_vec(),
        }
    }

    /// Replace the backoff schedule. An empty schedule means one attempt.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    /// Deliver an alert to a webhook URL with retry.
    ///
    /// Returns `Ok(())` on the first successful attempt.
    pub async fn deliver(&self, url: &str, event: &AlertEvent) -> Result<(), WebhookError> {
        let payload = serde_json::to_value(event).unwrap_or_else(|_| {
            serde_json::json!({
                "event_type": event.event_type,
                "account_id": event.account_id,
                "message": event.message,
            })
        });

        for (attempt, delay) in self.retry_delays.iter().enumerate() {
            match self.try_send(url, &payload).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        url,
                        error = %e,
                        "Alert webhook attempt failed, retrying"
                    );
                    tokio::time::sleep(*delay).await;
                }
            }
        }

        // Final attempt after the last backoff.
        match self.try_send(url, &payload).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(url, error = %e, "Alert webhook failed after all retries");
                Err(e)
            }
        }
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(&self, url: &str, payload: &serde_json::Value) -> Result<(), WebhookError> {
        let response = self.client.post(url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

impl Default for WebhookDelivery {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
