//! Errors surfaced by [`SpeechSynthesisController`](crate::SpeechSynthesisController).

use std::time::Duration;

use thiserror::Error;
use tilawa_core::SynthesisProviderError;

/// Why a synthesis request produced no playable audio.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    /// The health monitor reports the provider as down; no call was made.
    #[error("Speech synthesis is currently unavailable")]
    ServiceUnavailable,

    /// The provider call failed.
    #[error("Speech synthesis failed: {0}")]
    Service(String),

    #[error("Nothing to synthesize")]
    EmptyText,

    /// A newer request on the same controller replaced this one.
    #[error("Synthesis request was superseded by a newer one")]
    Superseded,

    /// The request was cancelled by the caller.
    #[error("Synthesis request was cancelled")]
    Cancelled,

    #[error("Synthesis timed out after {0:?}")]
    Timeout(Duration),
}

impl SynthesisError {
    /// Whether this failure says something about provider health.
    #[must_use]
    pub const fn is_service_failure(&self) -> bool {
        matches!(self, Self::Service(_) | Self::Timeout(_))
    }
}

impl From<SynthesisProviderError> for SynthesisError {
    fn from(err: SynthesisProviderError) -> Self {
        Self::Service(err.to_string())
    }
}
