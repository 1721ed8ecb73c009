//! Speak command handler.
//!
//! `speak` is a one-shot command, so the health monitor is never started:
//! the periodic loop would only outlive the single request. One manual
//! probe before the request gives the same fail-fast behavior.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tilawa_speech::SynthesisError;
use tracing::{debug, info};

use crate::bootstrap::{CliContext, quiet_emitter};
use crate::error::CliError;

/// Synthesize `text` and write the audio to `out`.
///
/// The provider is probed first so an outage is reported without sending
/// the text.
pub async fn execute(ctx: &CliContext, text: &str, language: &str, out: &Path) -> Result<()> {
    let emitter = quiet_emitter();
    let health = ctx.health_monitor(Arc::clone(&emitter))?;
    let controller = ctx.synthesis_controller(health.clone(), emitter)?;

    let healthy = health.probe().await;
    debug!(healthy, "Probed synthesis provider");
    let result = controller.request(text, language).await;
    health.shutdown();
    let session = result.map_err(speak_error)?;

    std::fs::write(out, &session.audio.bytes)
        .with_context(|| format!("Failed to write audio to {}", out.display()))?;
    session.control.complete();

    info!(bytes = session.audio.len(), "Synthesis complete");
    println!(
        "Wrote {} bytes of {} to {}",
        session.audio.len(),
        session.audio.content_type,
        out.display()
    );
    Ok(())
}

fn speak_error(error: SynthesisError) -> CliError {
    match error {
        SynthesisError::EmptyText => CliError::Config("--text must not be empty".into()),
        other => CliError::Service(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_a_usage_error() {
        assert_eq!(speak_error(SynthesisError::EmptyText).exit_code(), 78);
        assert_eq!(speak_error(SynthesisError::ServiceUnavailable).exit_code(), 69);
    }
}
