//! Tracks command handler.
//!
//! Lists a reciter's playlist with the audio URL each track resolves to.

use anyhow::Result;
use tilawa_core::Track;

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext, reciter: Option<String>) -> Result<()> {
    let reciter = ctx.reciter(reciter);
    let content = ctx.content_provider()?;

    let tracks = content
        .list_tracks(&reciter)
        .await
        .map_err(|e| CliError::Service(e.to_string()))?;

    if tracks.is_empty() {
        println!("Reciter {reciter} has no tracks.");
        return Ok(());
    }

    println!("{} track(s) for {reciter}:\n", tracks.len());
    for (index, track) in tracks.iter().enumerate() {
        let url = content
            .track_audio_url(&reciter, track.id)
            .await
            .map_err(|e| CliError::Service(e.to_string()))?;
        println!("{}", track_row(index, track, &url));
    }
    Ok(())
}

fn track_row(index: usize, track: &Track, url: &str) -> String {
    let title = track.title.as_deref().unwrap_or("--");
    format!("{index:>4}  {:>4}  {title:<24} {url}", track.id.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilawa_core::TrackId;

    #[test]
    fn rows_show_placeholder_for_untitled_tracks() {
        let row = track_row(0, &Track::new(TrackId(7)), "https://cdn.test/007.mp3");
        assert!(row.contains("--"));
        assert!(row.ends_with("https://cdn.test/007.mp3"));
    }
}
