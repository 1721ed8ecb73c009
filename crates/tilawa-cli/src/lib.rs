//! Command-line front end for tilawa.
//!
//! Wires the HTTP adapters to the playback and synthesis controllers and
//! exposes them as `probe`, `tracks`, `play` and `speak` subcommands.
//! Recitation audio is driven through [`silent_media::SilentBackend`], a
//! media clock with no audio output, so playlist behavior can be observed
//! as a stream of JSON events.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio_test as _;

// Used by main.rs only
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;
pub mod silent_media;

// Re-export primary types for convenient access
pub use bootstrap::{CliContext, bootstrap};
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;
pub use silent_media::SilentBackend;
