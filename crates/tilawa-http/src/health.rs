//! HTTP health probe for the synthesis provider.

use async_trait::async_trait;
use tilawa_core::{HealthProbe, ProbeError};
use url::Url;

use crate::config::HttpClientConfig;
use crate::error::HttpResult;
use crate::url::parse_base;

/// Healthy iff `GET {health_url}` answers with a 2xx status.
///
/// Response bodies are ignored.
#[derive(Debug, Clone)]
pub struct HttpHealthProbe {
    client: reqwest::Client,
    url: Url,
}

impl HttpHealthProbe {
    pub fn new(config: &HttpClientConfig, health_url: &str) -> HttpResult<Self> {
        Ok(Self {
            client: config.build_client(config.probe_timeout)?,
            url: parse_base(health_url)?,
        })
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn check(&self) -> Result<(), ProbeError> {
        match self.client.get(self.url.as_str()).send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(ProbeError::Status(response.status().as_u16())),
            Err(e) if e.is_timeout() => Err(ProbeError::Unreachable("timeout".to_string())),
            Err(e) => Err(ProbeError::Unreachable(e.to_string())),
        }
    }
}
