//! Pure domain logic for the adpilot automation engine.
//!
//! Nothing in this crate performs I/O. The guardrail evaluator, evidence
//! digest, budget arithmetic and policy snapshot are shared by the engine,
//! the persistence layer and the HTTP surface.

mod vocab;

pub mod alert;
pub mod audit;
pub mod budget;
pub mod error;
pub mod evidence;
pub mod guardrails;
pub mod recommendation;
pub mod settings;
pub mod types;
