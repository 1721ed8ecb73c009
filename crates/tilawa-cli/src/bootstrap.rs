//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where the HTTP adapters, the playback
//! controllers and the synthesis controller are wired together. Each
//! command asks the context for what it needs; a missing endpoint is only
//! an error for the commands that use it.

use std::sync::Arc;

use tilawa_core::{
    ContentProvider, HealthProbe, MediaBackend, PlaybackEventEmitter, ReciterId, Settings,
    SynthesisProvider,
};
use tilawa_http::{HttpClientConfig, HttpContentProvider, HttpHealthProbe, HttpSynthesisProvider};
use tilawa_playback::{AudioSessionController, PlaybackRegistry, PlaylistController};
use tilawa_speech::{HealthMonitor, SpeechSynthesisController};

use crate::error::CliError;
use crate::presentation::ConsoleEmitter;

/// Fully resolved context for CLI commands.
pub struct CliContext {
    settings: Settings,
    http: HttpClientConfig,
    registry: PlaybackRegistry,
}

impl CliContext {
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The reciter named on the command line, or the configured default.
    #[must_use]
    pub fn reciter(&self, requested: Option<String>) -> ReciterId {
        requested.map_or_else(
            || ReciterId::from(self.settings.effective_reciter()),
            ReciterId::new,
        )
    }

    /// Track listing and audio URL resolution.
    pub fn content_provider(&self) -> Result<Arc<dyn ContentProvider>, CliError> {
        let content = self
            .settings
            .content_base_url
            .as_deref()
            .ok_or_else(|| CliError::missing("content URL", "--content-url"))?;
        let audio = self
            .settings
            .audio_base_url
            .as_deref()
            .ok_or_else(|| CliError::missing("audio URL", "--audio-url"))?;
        Ok(Arc::new(HttpContentProvider::new(&self.http, content, audio)?))
    }

    /// Health monitor for the synthesis provider. Not started.
    pub fn health_monitor(
        &self,
        emitter: Arc<dyn PlaybackEventEmitter>,
    ) -> Result<HealthMonitor, CliError> {
        let url = self
            .settings
            .health_url
            .as_deref()
            .ok_or_else(|| CliError::missing("health URL", "--health-url"))?;
        let probe: Arc<dyn HealthProbe> = Arc::new(HttpHealthProbe::new(&self.http, url)?);
        Ok(HealthMonitor::from_settings(probe, &self.settings, emitter))
    }

    /// Synthesis controller gated by `health`.
    pub fn synthesis_controller(
        &self,
        health: HealthMonitor,
        emitter: Arc<dyn PlaybackEventEmitter>,
    ) -> Result<SpeechSynthesisController, CliError> {
        let url = self
            .settings
            .synthesis_url
            .as_deref()
            .ok_or_else(|| CliError::missing("synthesis URL", "--synthesis-url"))?;
        let provider: Arc<dyn SynthesisProvider> =
            Arc::new(HttpSynthesisProvider::new(&self.http, url)?);
        Ok(SpeechSynthesisController::new(provider, health, emitter)
            .with_timeout(self.settings.synthesis_timeout()))
    }

    /// Playlist for `reciter`, playing through `backend`.
    pub fn playlist(
        &self,
        backend: Arc<dyn MediaBackend>,
        reciter: ReciterId,
        emitter: Arc<dyn PlaybackEventEmitter>,
    ) -> Result<PlaylistController, CliError> {
        let content = self.content_provider()?;
        let session =
            AudioSessionController::new(self.registry.clone(), backend, Arc::clone(&emitter));
        Ok(PlaylistController::new(session, content, emitter, reciter))
    }
}

/// Emitter for commands that do not stream events.
#[must_use]
pub fn quiet_emitter() -> Arc<dyn PlaybackEventEmitter> {
    Arc::new(ConsoleEmitter::log_only())
}

/// Bootstrap the CLI from validated settings.
#[must_use]
pub fn bootstrap(settings: Settings) -> CliContext {
    CliContext {
        settings,
        http: HttpClientConfig::default(),
        registry: PlaybackRegistry::new(),
    }
}
