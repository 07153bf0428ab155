//! Engine error type.
//!
//! Only storage and wiring failures are errors. Policy blocks, executor
//! failures and caller mistakes are ordinary outcome values.

use adpilot_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A non-database store failed.
    #[error("Store error: {0}")]
    Store(String),

    /// The platform client could not be built.
    #[error("Platform client error: {0}")]
    Platform(#[from] adpilot_meta::MetaApiError),

    #[error("Recommendation generation failed: {0}")]
    Generation(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}
