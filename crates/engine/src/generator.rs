//! Recommendation generator seam.
//!
//! Detection rules live outside this crate; the scheduler only needs to
//! trigger them and learn what they produced.

use adpilot_core::settings::AutomationPolicy;
use adpilot_db::models::recommendation::Recommendation;
use async_trait::async_trait;

use crate::error::EngineError;

/// What one generation pass produced.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub generated: u32,
    /// Newly generated recommendations with `critical` severity.
    pub critical: Vec<Recommendation>,
    pub trend_data_available: bool,
}

/// Produces recommendations for an account from its performance data.
#[async_trait]
pub trait RecommendationGenerator: Send + Sync {
    async fn generate(&self, policy: &AutomationPolicy) -> Result<GenerationReport, EngineError>;
}

/// Generator used when no detection rules are wired in.
pub struct DisabledGenerator;

#[async_trait]
impl RecommendationGenerator for DisabledGenerator {
    async fn generate(&self, policy: &AutomationPolicy) -> Result<GenerationReport, EngineError> {
        tracing::debug!(
            account_id = %policy.account_id,
            "No recommendation generator configured"
        );
        Ok(GenerationReport::default())
    }
}
