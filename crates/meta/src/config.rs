//! Integration mode and client configuration loaded from the environment.

use std::time::Duration;

/// Default Graph API host.
pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";

/// Default Graph API version segment.
pub const DEFAULT_API_VERSION: &str = "v19.0";

/// Default timeout for a single platform call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Global switch between the real platform and canned simulations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrationMode {
    /// Never call the platform; every apply is simulated.
    #[default]
    Mock,
    /// Call the platform unless the account is in dry-run.
    Live,
}

impl IntegrationMode {
    /// Parse a mode literal. Anything other than `live` is `Mock`.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("live") {
            Self::Live
        } else {
            Self::Mock
        }
    }

    pub fn is_mock(self) -> bool {
        self == Self::Mock
    }

    /// Read `AD_INTEGRATION_MODE` (default `mock`).
    pub fn from_env() -> Self {
        std::env::var("AD_INTEGRATION_MODE")
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }
}

/// Ad-platform client configuration.
#[derive(Debug, Clone)]
pub struct MetaConfig {
    pub mode: IntegrationMode,
    pub access_token: String,
    pub base_url: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            mode: IntegrationMode::Mock,
            access_token: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl MetaConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                     | Default                      |
    /// |-----------------------------|------------------------------|
    /// | `AD_INTEGRATION_MODE`       | `mock`                       |
    /// | `META_ACCESS_TOKEN`         | empty                        |
    /// | `META_API_BASE_URL`         | `https://graph.facebook.com` |
    /// | `META_API_VERSION`          | `v19.0`                      |
    /// | `META_REQUEST_TIMEOUT_SECS` | `15`                         |
    pub fn from_env() -> Self {
        let timeout_secs: u64 = std::env::var("META_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            mode: IntegrationMode::from_env(),
            access_token: std::env::var("META_ACCESS_TOKEN").unwrap_or_default(),
            base_url: std::env::var("META_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_version: std::env::var("META_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}
