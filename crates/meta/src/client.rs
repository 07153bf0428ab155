//! Graph API client for campaign, ad set and ad writes.
//!
//! Requests carry the access token as a form or query parameter. A
//! response containing an `error` object is a failure whatever its HTTP
//! status.

use adpilot_core::budget::as_cents;
use async_trait::async_trait;
use serde_json::Value;

use crate::config::MetaConfig;
use crate::error::MetaApiError;
use crate::{AdPlatform, EntityBudget, EntityStatus};

/// HTTP client for the Meta Graph API.
pub struct MetaClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    timeout_secs: u64,
}

impl MetaClient {
    /// Create a client from configuration.
    pub fn new(config: &MetaConfig) -> Result<Self, MetaApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MetaApiError::Request)?;
        Ok(Self {
            client,
            base_url: format!(
                "{}/{}",
                config.base_url.trim_end_matches('/'),
                config.api_version
            ),
            access_token: config.access_token.clone(),
            timeout_secs: config.timeout.as_secs(),
        })
    }

    fn entity_url(&self, entity_id: &str) -> String {
        format!("{}/{}", self.base_url, entity_id)
    }

    /// POST form fields to an entity node.
    async fn post_fields(
        &self,
        entity_id: &str,
        fields: &[(&str, String)],
    ) -> Result<Value, MetaApiError> {
        let mut form: Vec<(&str, String)> = fields.to_vec();
        form.push(("access_token", self.access_token.clone()));

        let response = self
            .client
            .post(self.entity_url(entity_id))
            .form(&form)
            .send()
            .await
            .map_err(|e| self.classify_request_error(e))?;

        self.parse_response(response).await
    }

    // ---- private helpers ----

    fn classify_request_error(&self, err: reqwest::Error) -> MetaApiError {
        if err.is_timeout() {
            MetaApiError::Timeout(self.timeout_secs)
        } else {
            MetaApiError::Request(err)
        }
    }

    /// Read the body and turn error objects and bad statuses into errors.
    async fn parse_response(&self, response: reqwest::Response) -> Result<Value, MetaApiError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.classify_request_error(e))?;

        let parsed: Option<Value> = serde_json::from_str(&body).ok();

        if let Some(err) = parsed.as_ref().and_then(|v| v.get("error")) {
            return Err(MetaApiError::Api {
                message: err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown Meta API error")
                    .to_string(),
                code: err.get("code").and_then(Value::as_i64).unwrap_or(0),
            });
        }

        if !status.is_success() {
            return Err(MetaApiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        parsed.ok_or_else(|| MetaApiError::MalformedResponse(body))
    }
}

#[async_trait]
impl AdPlatform for MetaClient {
    async fn set_status(&self, entity_id: &str, status: EntityStatus) -> Result<Value, MetaApiError> {
        tracing::debug!(entity_id, status = status.as_str(), "Setting entity status");
        self.post_fields(entity_id, &[("status", status.as_str().to_string())])
            .await
    }

    async fn get_budget(&self, entity_id: &str) -> Result<EntityBudget, MetaApiError> {
        let response = self
            .client
            .get(self.entity_url(entity_id))
            .query(&[
                ("fields", "daily_budget,lifetime_budget"),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.classify_request_error(e))?;

        let body = self.parse_response(response).await?;
        let positive = |key: &str| body.get(key).and_then(as_cents).filter(|c| *c > 0);

        Ok(EntityBudget {
            daily_budget: positive("daily_budget"),
            lifetime_budget: positive("lifetime_budget"),
        })
    }

    async fn set_daily_budget(
        &self,
        entity_id: &str,
        daily_budget_cents: i64,
    ) -> Result<Value, MetaApiError> {
        tracing::debug!(entity_id, daily_budget_cents, "Setting daily budget");
        self.post_fields(entity_id, &[("daily_budget", daily_budget_cents.to_string())])
            .await
    }
}
