//! Terminal output for playback events.

use tilawa_core::{PlaybackEvent, PlaybackEventEmitter};
use tracing::{debug, warn};

/// Emitter that writes events for a terminal user.
///
/// In `json` mode every event is printed to stdout as one JSON line, which
/// makes `tilawa play` pipeable. Otherwise events only go to the debug log.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleEmitter {
    json: bool,
}

impl ConsoleEmitter {
    /// Print events as JSON lines.
    #[must_use]
    pub const fn json_lines() -> Self {
        Self { json: true }
    }

    /// Log events at debug level only.
    #[must_use]
    pub const fn log_only() -> Self {
        Self { json: false }
    }
}

/// One JSON line for `event`.
pub fn event_line(event: &PlaybackEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

impl PlaybackEventEmitter for ConsoleEmitter {
    fn emit(&self, event: PlaybackEvent) {
        if !self.json {
            debug!(event = event.name(), ?event, "Playback event");
            return;
        }
        match event_line(&event) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!(event = event.name(), error = %e, "Failed to serialize event"),
        }
    }

    fn clone_box(&self) -> Box<dyn PlaybackEventEmitter> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_lines_are_single_line_json() {
        let line = event_line(&PlaybackEvent::PlaylistAdvance { index: 3 }).unwrap();
        assert_eq!(line, r#"{"type":"playlist_advance","index":3}"#);
        assert!(!line.contains('\n'));
    }
}
