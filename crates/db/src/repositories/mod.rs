//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod account_lock_repo;
pub mod action_log_repo;
pub mod automation_settings_repo;
pub mod recommendation_repo;
pub mod scheduler_run_log_repo;

pub use account_lock_repo::AccountLockRepo;
pub use action_log_repo::ActionLogRepo;
pub use automation_settings_repo::AutomationSettingsRepo;
pub use recommendation_repo::RecommendationRepo;
pub use scheduler_run_log_repo::SchedulerRunLogRepo;
