//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create/upsert DTO for writes
//! - Query parameter structs for list endpoints

pub mod action_log;
pub mod automation_settings;
pub mod recommendation;
pub mod scheduler_run_log;
