//! CLI-specific error types and exit codes.

use thiserror::Error;
use tilawa_core::SettingsError;
use tilawa_http::HttpError;

#[derive(Debug, Error)]
pub enum CliError {
    /// Settings were well-formed but invalid.
    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),

    /// A configured endpoint could not be turned into an HTTP adapter.
    #[error("Invalid endpoint: {0}")]
    Http(#[from] HttpError),

    /// A required setting is missing or a config file is unreadable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A remote service could not fulfil the command.
    #[error("{0}")]
    Service(String),
}

impl CliError {
    /// Map error to an exit code (`EX_CONFIG` / `EX_UNAVAILABLE` from sysexits).
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Settings(_) | Self::Http(_) | Self::Config(_) => 78,
            Self::Service(_) => 69,
        }
    }

    pub(crate) fn missing(setting: &str, flag: &str) -> Self {
        Self::Config(format!("{setting} is not configured (use {flag})"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(CliError::Settings(SettingsError::EmptyReciter).exit_code(), 78);
        assert_eq!(CliError::missing("health URL", "--health-url").exit_code(), 78);
        assert_eq!(
            CliError::Http(HttpError::NotABase("mailto:x".into())).exit_code(),
            78
        );
        assert_eq!(CliError::Service("down".into()).exit_code(), 69);
    }

    #[test]
    fn missing_names_the_flag() {
        let err = CliError::missing("health URL", "--health-url");
        assert!(err.to_string().contains("--health-url"));
    }
}
