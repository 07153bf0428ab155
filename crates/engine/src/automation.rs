//! The engine facade.

use std::sync::Arc;

use adpilot_db::DbPool;
use adpilot_events::{AlertConfig, AlertDispatcher, Alerter};
use adpilot_meta::{AdPlatform, MetaClient, MetaConfig};

use crate::config::EngineConfig;
use crate::executor::ActionExecutor;
use crate::generator::{DisabledGenerator, RecommendationGenerator};
use crate::error::EngineError;
use crate::store::{AutomationStore, PgStore};

/// Owns the collaborators shared by the apply pipeline, the scheduler
/// cycle and the approval transitions.
///
/// Cheap to share behind an `Arc`; every entry point takes `&self`.
pub struct Automation {
    pub(crate) store: Arc<dyn AutomationStore>,
    pub(crate) executor: ActionExecutor,
    pub(crate) alerter: Arc<dyn Alerter>,
    pub(crate) generator: Arc<dyn RecommendationGenerator>,
    pub(crate) config: EngineConfig,
}

impl Automation {
    pub fn new(
        store: Arc<dyn AutomationStore>,
        platform: Arc<dyn AdPlatform>,
        alerter: Arc<dyn Alerter>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            executor: ActionExecutor::new(platform),
            alerter,
            generator: Arc::new(DisabledGenerator),
            config,
        }
    }

    /// Production wiring: Postgres store, Graph API client and the alert
    /// channels configured in the environment.
    pub fn from_env(pool: DbPool) -> Result<Self, EngineError> {
        let meta = MetaConfig::from_env();
        let config = EngineConfig { mode: meta.mode };
        if !config.mode.is_mock() && meta.access_token.is_empty() {
            tracing::warn!("Live integration mode without META_ACCESS_TOKEN; platform calls will fail");
        }
        let platform = MetaClient::new(&meta)?;

        let alerter = AlertDispatcher::new(AlertConfig::from_env());
        if !alerter.has_channels() {
            tracing::warn!("No alert channel configured; alerts will only be logged");
        }

        tracing::info!(mode = ?config.mode, "Automation engine configured");
        Ok(Self::new(
            Arc::new(PgStore::new(pool)),
            Arc::new(platform),
            Arc::new(alerter),
            config,
        ))
    }

    /// Replace the default [`DisabledGenerator`].
    pub fn with_generator(mut self, generator: Arc<dyn RecommendationGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn store(&self) -> &Arc<dyn AutomationStore> {
        &self.store
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }
}
