//! Ad-platform integration.
//!
//! The engine talks to the platform only through the [`AdPlatform`] trait;
//! [`MetaClient`] is the Graph API implementation.

pub mod client;
pub mod config;
pub mod error;

use async_trait::async_trait;

pub use client::MetaClient;
pub use config::{IntegrationMode, MetaConfig};
pub use error::MetaApiError;

/// Delivery status written to a campaign, ad set or ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityStatus {
    Paused,
    Active,
}

impl EntityStatus {
    /// Literal the platform expects in the `status` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paused => "PAUSED",
            Self::Active => "ACTIVE",
        }
    }
}

/// Budget fields of an entity, in cents. Absent or zero values are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityBudget {
    pub daily_budget: Option<i64>,
    pub lifetime_budget: Option<i64>,
}

/// Write surface of the ad platform.
///
/// Every method returns the raw JSON response on success so callers can
/// keep it for the audit trail.
#[async_trait]
pub trait AdPlatform: Send + Sync {
    /// Set the delivery status of an entity.
    async fn set_status(
        &self,
        entity_id: &str,
        status: EntityStatus,
    ) -> Result<serde_json::Value, MetaApiError>;

    /// Read the current budget fields of an entity.
    async fn get_budget(&self, entity_id: &str) -> Result<EntityBudget, MetaApiError>;

    /// Overwrite the daily budget of an entity.
    async fn set_daily_budget(
        &self,
        entity_id: &str,
        daily_budget_cents: i64,
    ) -> Result<serde_json::Value, MetaApiError>;
}
