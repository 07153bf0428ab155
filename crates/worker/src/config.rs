use std::time::Duration;

/// Default cycle interval: 15 minutes.
const DEFAULT_INTERVAL_SECS: u64 = 900;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Time between scheduler ticks.
    pub interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
        }
    }
}

impl WorkerConfig {
    /// Load from `SCHEDULER_INTERVAL_SECS` (default `900`). Zero or
    /// unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let secs = std::env::var("SCHEDULER_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_INTERVAL_SECS);
        Self {
            interval: Duration::from_secs(secs),
        }
    }
}
