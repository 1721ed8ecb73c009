//! reqwest adapters for the tilawa ports.
//!
//! - [`HttpContentProvider`] - reciter track listings and audio URLs
//! - [`HttpSynthesisProvider`] - `POST` text, receive audio
//! - [`HttpHealthProbe`] - 2xx means healthy
//!
//! All adapters share an [`HttpClientConfig`].

#![deny(unused_crate_dependencies)]

pub mod config;
pub mod content;
pub mod error;
pub mod health;
pub mod synthesis;
pub mod url;

pub use config::HttpClientConfig;
pub use content::HttpContentProvider;
pub use error::{HttpError, HttpResult};
pub use health::HttpHealthProbe;
pub use synthesis::HttpSynthesisProvider;

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio_test as _;
