//! Speech synthesis provider over HTTP.

use async_trait::async_trait;
use serde::Serialize;
use tilawa_core::{SpeechAudio, SynthesisProvider, SynthesisProviderError};
use tracing::debug;
use url::Url;

use crate::config::HttpClientConfig;
use crate::error::HttpResult;
use crate::url::parse_base;

/// Content type assumed when the provider does not send one.
const DEFAULT_CONTENT_TYPE: &str = "audio/mpeg";

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    language: &'a str,
}

/// Posts `{ "text", "language" }` and returns the response body as audio.
#[derive(Debug, Clone)]
pub struct HttpSynthesisProvider {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpSynthesisProvider {
    pub fn new(config: &HttpClientConfig, synthesis_url: &str) -> HttpResult<Self> {
        Ok(Self {
            client: config.build_client(config.timeout)?,
            endpoint: parse_base(synthesis_url)?,
        })
    }
}

#[async_trait]
impl SynthesisProvider for HttpSynthesisProvider {
    async fn synthesize(
        &self,
        text: &str,
        language: &str,
    ) -> Result<SpeechAudio, SynthesisProviderError> {
        debug!(endpoint = %self.endpoint, language, chars = text.chars().count(), "Requesting speech");

        let response = self
            .client
            .post(self.endpoint.as_str())
            .json(&SynthesisRequest { text, language })
            .send()
            .await
            .map_err(|e| SynthesisProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SynthesisProviderError::Status {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SynthesisProviderError::Transport(e.to_string()))?;
        if bytes.is_empty() {
            return Err(SynthesisProviderError::EmptyAudio);
        }

        Ok(SpeechAudio::new(bytes.to_vec(), content_type))
    }
}
