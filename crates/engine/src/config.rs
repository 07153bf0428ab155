//! Engine configuration.

use adpilot_meta::IntegrationMode;

/// Settings that apply to every account handled by this process.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineConfig {
    /// In `Mock` mode the platform client is never called.
    pub mode: IntegrationMode,
}

impl EngineConfig {
    pub fn mock() -> Self {
        Self {
            mode: IntegrationMode::Mock,
        }
    }

    pub fn live() -> Self {
        Self {
            mode: IntegrationMode::Live,
        }
    }
}
