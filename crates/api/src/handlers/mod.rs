pub mod action_logs;
pub mod recommendations;
pub mod scheduler;
pub mod settings;
