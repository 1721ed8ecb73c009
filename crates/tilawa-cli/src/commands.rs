//! Available subcommands.

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check whether the speech synthesis provider is reachable
    Probe,

    /// List the tracks of a reciter
    Tracks {
        /// Reciter id (defaults to the configured reciter)
        #[arg(short, long)]
        reciter: Option<String>,
    },

    /// Play a reciter playlist on a silent media clock, printing events
    Play {
        /// Reciter id (defaults to the configured reciter)
        #[arg(short, long)]
        reciter: Option<String>,
        /// Index of the first track to play
        #[arg(long, default_value_t = 0)]
        from: usize,
        /// Stop after this many tracks
        #[arg(long)]
        count: Option<usize>,
        /// Simulated length of every track, in seconds
        #[arg(long, default_value_t = 3.0)]
        track_secs: f64,
    },

    /// Synthesize speech and write the audio to a file
    Speak {
        /// Text to speak
        #[arg(short, long)]
        text: String,
        /// Language tag of the text
        #[arg(short, long, default_value = "en")]
        language: String,
        /// Output file for the audio
        #[arg(short, long)]
        out: PathBuf,
    },
}
