//! Periodic scheduler worker.
//!
//! Every interval, runs one `scheduled` cycle for each account whose
//! scheduler switch is on.

pub mod config;
pub mod scheduler_loop;

pub use config::WorkerConfig;
pub use scheduler_loop::{SchedulerLoop, TickReport};
