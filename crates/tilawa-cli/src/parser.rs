//! Root CLI structure and global options.
//!
//! Every global option can also come from a `TILAWA_*` environment variable
//! (a `.env` file is loaded first). Precedence, lowest to highest:
//! built-in defaults, the JSON file given by `--config`, flags/env vars.

use std::path::PathBuf;

use clap::Parser;
use tilawa_core::{Settings, validate_settings};

use crate::commands::Commands;
use crate::error::CliError;

/// Recitation playback and translation speech from the command line.
#[derive(Debug, Parser)]
#[command(name = "tilawa")]
#[command(about = "Play Quran recitations and synthesize translations")]
#[command(version)]
pub struct Cli {
    /// JSON settings file
    #[arg(long, env = "TILAWA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the content API (track listings)
    #[arg(long, env = "TILAWA_CONTENT_URL", global = true)]
    pub content_url: Option<String>,

    /// Base URL under which reciter audio lives
    #[arg(long, env = "TILAWA_AUDIO_URL", global = true)]
    pub audio_url: Option<String>,

    /// Speech synthesis endpoint
    #[arg(long, env = "TILAWA_SYNTHESIS_URL", global = true)]
    pub synthesis_url: Option<String>,

    /// Synthesis provider health endpoint
    #[arg(long, env = "TILAWA_HEALTH_URL", global = true)]
    pub health_url: Option<String>,

    /// Seconds before re-probing an unhealthy provider
    #[arg(long, env = "TILAWA_HEALTH_RETRY_SECS", global = true)]
    pub health_retry_secs: Option<u64>,

    /// Seconds between periodic health probes
    #[arg(long, env = "TILAWA_HEALTH_PROBE_SECS", global = true)]
    pub health_probe_secs: Option<u64>,

    /// Upper bound on a synthesis request, in seconds
    #[arg(long, env = "TILAWA_SYNTHESIS_TIMEOUT_SECS", global = true)]
    pub synthesis_timeout_secs: Option<u64>,

    /// Reciter used when a command does not name one
    #[arg(long, env = "TILAWA_DEFAULT_RECITER", global = true)]
    pub default_reciter: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Settings given directly on the command line or through the environment.
    #[must_use]
    pub fn flag_settings(&self) -> Settings {
        Settings {
            content_base_url: self.content_url.clone(),
            audio_base_url: self.audio_url.clone(),
            synthesis_url: self.synthesis_url.clone(),
            health_url: self.health_url.clone(),
            default_reciter: self.default_reciter.clone(),
            health_probe_interval_secs: self.health_probe_secs,
            health_retry_interval_secs: self.health_retry_secs,
            synthesis_timeout_secs: self.synthesis_timeout_secs,
        }
    }

    /// Resolve and validate the effective settings.
    pub fn settings(&self) -> Result<Settings, CliError> {
        let mut settings = Settings::with_defaults();

        if let Some(ref path) = self.config {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))?;
            settings.merge(&Settings::from_json_str(&raw)?);
        }
        settings.merge(&self.flag_settings());

        validate_settings(&settings)?;
        Ok(settings)
    }
}
