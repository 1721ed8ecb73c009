//! Construction errors for the HTTP adapters.
//!
//! Request-time failures are mapped straight to the core port errors
//! (`ContentError`, `SynthesisProviderError`, `ProbeError`); this type only
//! covers building an adapter.

use thiserror::Error;

pub type HttpResult<T> = Result<T, HttpError>;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The URL parsed but cannot carry path segments (e.g. `mailto:`).
    #[error("URL '{0}' cannot be used as a base URL")]
    NotABase(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}
