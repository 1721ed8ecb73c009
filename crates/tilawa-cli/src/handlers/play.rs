//! Play command handler.
//!
//! Drives a reciter playlist on the silent media clock and prints every
//! playback event as a JSON line. Playback stops when the playlist
//! completes, a track fails, or `count` tracks have started.

use std::sync::Arc;

use anyhow::Result;
use tilawa_core::{MediaBackend, PlaybackEventEmitter};
use tilawa_playback::{PlaylistController, PlaylistStep};
use tracing::info;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::ConsoleEmitter;
use crate::silent_media::SilentBackend;

/// Options of the `play` command.
#[derive(Debug, Clone)]
pub struct PlayArgs {
    pub reciter: Option<String>,
    pub from: usize,
    pub count: Option<usize>,
    pub track_secs: f64,
}

pub async fn execute(ctx: &CliContext, args: PlayArgs) -> Result<()> {
    if !(args.track_secs.is_finite() && args.track_secs > 0.0) {
        return Err(CliError::Config(format!(
            "--track-secs must be a positive number of seconds, got {}",
            args.track_secs
        ))
        .into());
    }

    let reciter = ctx.reciter(args.reciter);
    let backend: Arc<dyn MediaBackend> = Arc::new(SilentBackend::new(args.track_secs));
    let emitter: Arc<dyn PlaybackEventEmitter> = Arc::new(ConsoleEmitter::json_lines());
    let mut playlist = ctx.playlist(backend, reciter, emitter)?;

    let loaded = playlist
        .load_tracks()
        .await
        .map_err(|e| CliError::Service(e.to_string()))?;
    info!(reciter = %playlist.reciter(), tracks = loaded, "Loaded playlist");

    let played = run(&mut playlist, args.from, args.count).await?;
    info!(played, "Playback finished");
    Ok(())
}

/// Play from `from` until the playlist stops. Returns how many tracks started.
pub async fn run(
    playlist: &mut PlaylistController,
    from: usize,
    count: Option<usize>,
) -> Result<usize, CliError> {
    let limit = count.unwrap_or(usize::MAX);
    if limit == 0 {
        return Ok(0);
    }

    playlist
        .play(from)
        .await
        .map_err(|e| CliError::Service(e.to_string()))?;
    let mut started = 1;

    while let Some(step) = playlist.process_next_event().await {
        match step {
            PlaylistStep::Continue => {}
            PlaylistStep::Advanced { index, .. } => {
                if started == limit {
                    info!(index, "Track limit reached");
                    playlist.stop();
                    break;
                }
                started += 1;
            }
            PlaylistStep::Completed => break,
            PlaylistStep::Halted(error) => return Err(CliError::Service(error.to_string())),
            PlaylistStep::AdvanceFailed { index, error } => {
                return Err(CliError::Service(format!(
                    "track {index} could not start: {error}"
                )));
            }
        }
    }
    Ok(started)
}
