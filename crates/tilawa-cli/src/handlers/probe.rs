//! Probe command handler.

use anyhow::Result;

use crate::bootstrap::{CliContext, quiet_emitter};
use crate::error::CliError;

/// Run one health probe against the synthesis provider.
///
/// # Errors
///
/// Returns [`CliError::Service`] when the provider is unhealthy.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let monitor = ctx.health_monitor(quiet_emitter())?;

    if monitor.probe().await {
        println!("Speech synthesis is available.");
        Ok(())
    } else {
        Err(CliError::Service("speech synthesis is unavailable".into()).into())
    }
}
