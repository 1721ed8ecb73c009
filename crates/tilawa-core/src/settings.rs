//! Settings domain types and validation.
//!
//! Pure data with no infrastructure dependencies. Adapters build a
//! [`Settings`] from flags, environment or a JSON file and validate it once
//! at startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default reciter for playlists.
pub const DEFAULT_RECITER: &str = "Alafasy_128kbps";

/// Default period between health probes of the synthesis provider.
pub const DEFAULT_HEALTH_PROBE_INTERVAL_SECS: u64 = 60;

/// Default delay before re-probing an unhealthy synthesis provider.
pub const DEFAULT_HEALTH_RETRY_INTERVAL_SECS: u64 = 10;

/// Application settings.
///
/// All fields are optional to support partial configuration and graceful
/// defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the content provider API (track listings).
    pub content_base_url: Option<String>,

    /// Base URL under which per-reciter track audio lives.
    pub audio_base_url: Option<String>,

    /// Endpoint of the speech synthesis provider.
    pub synthesis_url: Option<String>,

    /// Endpoint probed to decide whether synthesis is available.
    pub health_url: Option<String>,

    /// Reciter used when none is selected.
    pub default_reciter: Option<String>,

    /// Seconds between periodic health probes.
    pub health_probe_interval_secs: Option<u64>,

    /// Seconds before retrying after a failed probe.
    pub health_retry_interval_secs: Option<u64>,

    /// Optional upper bound on a synthesis request, in seconds.
    ///
    /// Unset means the transport's own timeout applies.
    pub synthesis_timeout_secs: Option<u64>,
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            content_base_url: None,
            audio_base_url: None,
            synthesis_url: None,
            health_url: None,
            default_reciter: Some(DEFAULT_RECITER.to_string()),
            health_probe_interval_secs: Some(DEFAULT_HEALTH_PROBE_INTERVAL_SECS),
            health_retry_interval_secs: Some(DEFAULT_HEALTH_RETRY_INTERVAL_SECS),
            synthesis_timeout_secs: None,
        }
    }

    /// Parse settings from a JSON document. Missing fields stay `None`.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(json).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Get the effective default reciter.
    #[must_use]
    pub fn effective_reciter(&self) -> &str {
        self.default_reciter.as_deref().unwrap_or(DEFAULT_RECITER)
    }

    /// Get the effective periodic probe interval.
    #[must_use]
    pub fn effective_probe_interval(&self) -> Duration {
        Duration::from_secs(
            self.health_probe_interval_secs
                .unwrap_or(DEFAULT_HEALTH_PROBE_INTERVAL_SECS),
        )
    }

    /// Get the effective retry interval after a failed probe.
    #[must_use]
    pub fn effective_retry_interval(&self) -> Duration {
        Duration::from_secs(
            self.health_retry_interval_secs
                .unwrap_or(DEFAULT_HEALTH_RETRY_INTERVAL_SECS),
        )
    }

    /// Get the synthesis timeout, if one is configured.
    #[must_use]
    pub fn synthesis_timeout(&self) -> Option<Duration> {
        self.synthesis_timeout_secs.map(Duration::from_secs)
    }

    /// Overlay `other` onto `self`, keeping existing values where `other` is `None`.
    pub fn merge(&mut self, other: &Self) {
        fn take<T: Clone>(slot: &mut Option<T>, value: Option<&T>) {
            if let Some(v) = value {
                *slot = Some(v.clone());
            }
        }
        take(&mut self.content_base_url, other.content_base_url.as_ref());
        take(&mut self.audio_base_url, other.audio_base_url.as_ref());
        take(&mut self.synthesis_url, other.synthesis_url.as_ref());
        take(&mut self.health_url, other.health_url.as_ref());
        take(&mut self.default_reciter, other.default_reciter.as_ref());
        take(
            &mut self.health_probe_interval_secs,
            other.health_probe_interval_secs.as_ref(),
        );
        take(
            &mut self.health_retry_interval_secs,
            other.health_retry_interval_secs.as_ref(),
        );
        take(
            &mut self.synthesis_timeout_secs,
            other.synthesis_timeout_secs.as_ref(),
        );
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("{field} must be at least 1 second, got {value}")]
    IntervalTooShort { field: &'static str, value: u64 },

    #[error("{field} must be an http(s) URL, got '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("Reciter id cannot be empty")]
    EmptyReciter,

    #[error("Could not parse settings: {0}")]
    Parse(String),
}

/// Validate settings.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    let intervals = [
        ("health_probe_interval_secs", settings.health_probe_interval_secs),
        ("health_retry_interval_secs", settings.health_retry_interval_secs),
        ("synthesis_timeout_secs", settings.synthesis_timeout_secs),
    ];
    for (field, value) in intervals {
        if let Some(value) = value {
            if value == 0 {
                return Err(SettingsError::IntervalTooShort { field, value });
            }
        }
    }

    let urls = [
        ("content_base_url", settings.content_base_url.as_deref()),
        ("audio_base_url", settings.audio_base_url.as_deref()),
        ("synthesis_url", settings.synthesis_url.as_deref()),
        ("health_url", settings.health_url.as_deref()),
    ];
    for (field, value) in urls {
        if let Some(value) = value {
            let trimmed = value.trim();
            if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
                return Err(SettingsError::InvalidUrl {
                    field,
                    value: value.to_string(),
                });
            }
        }
    }

    if let Some(ref reciter) = settings.default_reciter {
        if reciter.trim().is_empty() {
            return Err(SettingsError::EmptyReciter);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::with_defaults();
        assert!(validate_settings(&settings).is_ok());
        assert_eq!(settings.effective_reciter(), DEFAULT_RECITER);
        assert_eq!(settings.effective_probe_interval(), Duration::from_secs(60));
        assert_eq!(settings.effective_retry_interval(), Duration::from_secs(10));
        assert!(settings.synthesis_timeout().is_none());
    }

    #[test]
    fn empty_settings_fall_back_to_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.effective_reciter(), DEFAULT_RECITER);
        assert_eq!(
            settings.effective_retry_interval(),
            Duration::from_secs(DEFAULT_HEALTH_RETRY_INTERVAL_SECS)
        );
    }

    #[test]
    fn zero_interval_is_rejected() {
        let settings = Settings {
            health_retry_interval_secs: Some(0),
            ..Settings::with_defaults()
        };
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::IntervalTooShort {
                field: "health_retry_interval_secs",
                value: 0
            })
        );
    }

    #[test]
    fn non_http_url_is_rejected() {
        let settings = Settings {
            synthesis_url: Some("ftp://tts.example".to_string()),
            ..Settings::with_defaults()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidUrl {
                field: "synthesis_url",
                ..
            })
        ));
    }

    #[test]
    fn blank_reciter_is_rejected() {
        let settings = Settings {
            default_reciter: Some("  ".to_string()),
            ..Settings::default()
        };
        assert_eq!(validate_settings(&settings), Err(SettingsError::EmptyReciter));
    }

    #[test]
    fn json_overlay_merges_only_present_fields() {
        let mut settings = Settings::with_defaults();
        let file = Settings::from_json_str(
            r#"{ "health_url": "https://tts.example/health", "health_retry_interval_secs": 5 }"#,
        )
        .unwrap();

        settings.merge(&file);

        assert_eq!(settings.health_url.as_deref(), Some("https://tts.example/health"));
        assert_eq!(settings.effective_retry_interval(), Duration::from_secs(5));
        assert_eq!(settings.effective_reciter(), DEFAULT_RECITER);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            Settings::from_json_str("{ not json"),
            Err(SettingsError::Parse(_))
        ));
    }
}
