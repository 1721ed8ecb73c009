//! Synthesis provider port - on-demand speech for arbitrary text.

use async_trait::async_trait;
use thiserror::Error;

/// Synthesized speech returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechAudio {
    /// Encoded audio bytes, played back by the platform.
    pub bytes: Vec<u8>,
    /// MIME type reported by the provider (e.g. `audio/mpeg`).
    pub content_type: String,
}

impl SpeechAudio {
    #[must_use]
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Errors returned by a [`SynthesisProvider`].
#[derive(Debug, Clone, Error)]
pub enum SynthesisProviderError {
    /// Network failure before a response arrived.
    #[error("Synthesis request failed: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("Synthesis provider returned status {status}")]
    Status { status: u16 },

    /// The provider answered with no audio.
    #[error("Synthesis provider returned no audio")]
    EmptyAudio,
}

/// Backend-agnostic speech synthesis service.
#[async_trait]
pub trait SynthesisProvider: Send + Sync {
    /// Synthesize `text` spoken in `language` (BCP-47 tag, e.g. `"en"`).
    async fn synthesize(
        &self,
        text: &str,
        language: &str,
    ) -> Result<SpeechAudio, SynthesisProviderError>;
}
