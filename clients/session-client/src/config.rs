//! Client configuration.

use std::time::Duration;

/// Tunables for the session client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API, e.g. `https://api.example.com`.
    pub base_url: String,
    /// Path of the refresh endpoint.
    pub refresh_path: String,
    /// Upper bound on one refresh network call; a hung call must fail
    /// the coordinator's waiters rather than hang them.
    pub refresh_timeout: Duration,
    /// Tokens within this much of expiry are treated as expired by the
    /// local pre-check, absorbing clock skew.
    pub expiry_leeway: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            refresh_path: "/auth/refresh".to_string(),
            refresh_timeout: Duration::from_secs(10),
            expiry_leeway: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Config pointed at a base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Override the refresh timeout.
    #[must_use]
    pub const fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    /// Override the expiry leeway.
    #[must_use]
    pub const fn with_expiry_leeway(mut self, leeway: Duration) -> Self {
        self.expiry_leeway = leeway;
        self
    }

    /// Full URL of the refresh endpoint.
    #[must_use]
    pub fn refresh_url(&self) -> String {
        format!("{}{}", self.base_url, self.refresh_path)
    }
}
