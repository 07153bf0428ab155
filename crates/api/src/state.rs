use std::sync::Arc;

use adpilot_engine::{Automation, AutomationStore};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Apply pipeline, scheduler cycle and approvals.
    pub automation: Arc<Automation>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(automation: Automation, config: ServerConfig) -> Self {
        Self {
            automation: Arc::new(automation),
            config: Arc::new(config),
        }
    }

    /// The store the engine reads and writes.
    pub fn store(&self) -> &Arc<dyn AutomationStore> {
        self.automation.store()
    }
}
