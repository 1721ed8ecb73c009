//! Identity of *what* is being played.
//!
//! A recitation session plays either a single verse or a full-length
//! playlist track under a chosen reciter. [`SourceKey`] captures both.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of surahs in the mushaf.
pub const SURAH_COUNT: u16 = 114;

/// Error returned when a verse reference is out of range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerseKeyError {
    #[error("Surah number must be between 1 and {SURAH_COUNT}, got {0}")]
    InvalidSurah(u16),

    #[error("Ayah number must be at least 1")]
    InvalidAyah,

    #[error("Malformed verse reference '{0}' (expected 'surah:ayah')")]
    Malformed(String),
}

/// A `(surah, ayah)` verse reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VerseKey {
    surah: u16,
    ayah: u16,
}

impl VerseKey {
    /// Create a validated verse key.
    pub fn new(surah: u16, ayah: u16) -> Result<Self, VerseKeyError> {
        if surah == 0 || surah > SURAH_COUNT {
            return Err(VerseKeyError::InvalidSurah(surah));
        }
        if ayah == 0 {
            return Err(VerseKeyError::InvalidAyah);
        }
        Ok(Self { surah, ayah })
    }

    #[must_use]
    pub const fn surah(&self) -> u16 {
        self.surah
    }

    #[must_use]
    pub const fn ayah(&self) -> u16 {
        self.ayah
    }
}

impl fmt::Display for VerseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.surah, self.ayah)
    }
}

impl std::str::FromStr for VerseKey {
    type Err = VerseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (surah, ayah) = s
            .split_once(':')
            .ok_or_else(|| VerseKeyError::Malformed(s.to_string()))?;
        let surah = surah
            .trim()
            .parse()
            .map_err(|_| VerseKeyError::Malformed(s.to_string()))?;
        let ayah = ayah
            .trim()
            .parse()
            .map_err(|_| VerseKeyError::Malformed(s.to_string()))?;
        Self::new(surah, ayah)
    }
}

/// Identifier of a reciter (narrator) as understood by the content provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReciterId(String);

impl ReciterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReciterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReciterId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifier of a playlist track (for full-surah playlists, the surah number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of a playlist as listed by the content provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Track {
    #[must_use]
    pub const fn new(id: TrackId) -> Self {
        Self { id, title: None }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// What a playback session is playing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKey {
    /// A single verse recitation.
    Verse(VerseKey),
    /// A full-length playlist track.
    Track { reciter: ReciterId, track: TrackId },
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verse(key) => write!(f, "verse {key}"),
            Self::Track { reciter, track } => write!(f, "track {track} ({reciter})"),
        }
    }
}

impl From<VerseKey> for SourceKey {
    fn from(key: VerseKey) -> Self {
        Self::Verse(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verse_key_rejects_out_of_range() {
        assert_eq!(VerseKey::new(0, 1), Err(VerseKeyError::InvalidSurah(0)));
        assert_eq!(VerseKey::new(115, 1), Err(VerseKeyError::InvalidSurah(115)));
        assert_eq!(VerseKey::new(2, 0), Err(VerseKeyError::InvalidAyah));
        assert!(VerseKey::new(114, 6).is_ok());
    }

    #[test]
    fn verse_key_parses_and_displays() {
        let key: VerseKey = "2:255".parse().unwrap();
        assert_eq!(key.surah(), 2);
        assert_eq!(key.ayah(), 255);
        assert_eq!(key.to_string(), "2:255");

        assert!(matches!(
            "2-255".parse::<VerseKey>(),
            Err(VerseKeyError::Malformed(_))
        ));
    }

    #[test]
    fn source_keys_compare_by_content() {
        let a = SourceKey::from(VerseKey::new(2, 5).unwrap());
        let b = SourceKey::from(VerseKey::new(2, 6).unwrap());
        assert_ne!(a, b);

        let t1 = SourceKey::Track {
            reciter: ReciterId::from("Q"),
            track: TrackId(1),
        };
        assert_eq!(t1.to_string(), "track 1 (Q)");
    }
}
