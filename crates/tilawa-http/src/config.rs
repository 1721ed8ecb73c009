//! Shared HTTP client configuration for the tilawa adapters.

use std::time::Duration;

use crate::error::{HttpError, HttpResult};

/// Default request timeout for content and synthesis calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for a single health probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration shared by every HTTP adapter.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tilawa_http::HttpClientConfig;
///
/// let config = HttpClientConfig::new()
///     .with_timeout(Duration::from_secs(10))
///     .with_user_agent("tilawa-test/1.0");
/// ```
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub(crate) user_agent: String,
    pub(crate) timeout: Duration,
    pub(crate) probe_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("tilawa/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: DEFAULT_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl HttpClientConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout for content and synthesis calls.
    ///
    /// Defaults to 30 seconds.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the timeout of a single health probe.
    ///
    /// Defaults to 2 seconds.
    #[must_use]
    pub const fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    pub(crate) fn build_client(&self, timeout: Duration) -> HttpResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(HttpError::Client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = HttpClientConfig::new();
        assert!(config.user_agent.starts_with("tilawa/"));
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.probe_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn builder_overrides() {
        let config = HttpClientConfig::new()
            .with_user_agent("agent")
            .with_timeout(Duration::from_secs(5))
            .with_probe_timeout(Duration::from_millis(250));

        assert_eq!(config.user_agent, "agent");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.probe_timeout(), Duration::from_millis(250));
    }
}
