//! Guardrailed automation engine.
//!
//! Turns approved recommendations into audited ad-platform writes:
//!
//! - [`executor`] issues (or simulates) a single platform write.
//! - [`pipeline`] applies one recommendation: gates, guardrails, executor,
//!   audit log, status transition.
//! - [`scheduler`] runs one control-loop cycle for an account.
//! - [`approvals`] holds the human approve / reject transitions.
//! - [`store`] is the persistence seam, with a Postgres implementation and
//!   an in-memory one in [`memory`].

pub mod approvals;
pub mod automation;
pub mod config;
pub mod error;
pub mod executor;
pub mod generator;
pub mod lock;
pub mod memory;
pub mod pipeline;
pub mod scheduler;
pub mod store;

pub use approvals::TransitionOutcome;
pub use automation::Automation;
pub use config::EngineConfig;
pub use error::EngineError;
pub use generator::{DisabledGenerator, GenerationReport, RecommendationGenerator};
pub use memory::MemoryStore;
pub use pipeline::{ApplyOptions, ApplyOutcome, SkipReason};
pub use scheduler::CycleReport;
pub use store::{AutomationStore, PgStore};
