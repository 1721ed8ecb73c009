//! Command handlers.
//!
//! Handlers follow the canonical pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Thin wrappers that ask the context for controllers, drive them, and
//!   format the result for the terminal
//!
//! Failures that should pick a specific exit code are returned as
//! [`CliError`](crate::CliError) inside the `anyhow` error.

pub mod play;
pub mod probe;
pub mod speak;
pub mod tracks;
