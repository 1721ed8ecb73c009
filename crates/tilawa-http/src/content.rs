//! Content provider over HTTP.

use async_trait::async_trait;
use serde::Deserialize;
use tilawa_core::{ContentError, ContentProvider, ReciterId, Track, TrackId};
use tracing::debug;
use url::Url;

use crate::config::HttpClientConfig;
use crate::error::HttpResult;
use crate::url::{parse_base, track_audio_url, tracks_url};

/// Track entry as returned by the listing endpoint.
#[derive(Debug, Deserialize)]
struct TrackDto {
    id: u32,
    #[serde(default)]
    title: Option<String>,
}

impl From<TrackDto> for Track {
    fn from(dto: TrackDto) -> Self {
        let track = Self::new(TrackId(dto.id));
        match dto.title {
            Some(title) => track.with_title(title),
            None => track,
        }
    }
}

/// Lists reciter tracks from a JSON API and derives audio URLs from a CDN base.
#[derive(Debug, Clone)]
pub struct HttpContentProvider {
    client: reqwest::Client,
    content_base: Url,
    audio_base: Url,
}

impl HttpContentProvider {
    pub fn new(
        config: &HttpClientConfig,
        content_base_url: &str,
        audio_base_url: &str,
    ) -> HttpResult<Self> {
        Ok(Self {
            client: config.build_client(config.timeout)?,
            content_base: parse_base(content_base_url)?,
            audio_base: parse_base(audio_base_url)?,
        })
    }
}

#[async_trait]
impl ContentProvider for HttpContentProvider {
    async fn list_tracks(&self, reciter: &ReciterId) -> Result<Vec<Track>, ContentError> {
        let url = tracks_url(&self.content_base, reciter);
        debug!(%url, "Listing reciter tracks");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| ContentError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ContentError::NotFound(format!("reciter {reciter}")));
        }
        if !status.is_success() {
            return Err(ContentError::Unavailable(format!(
                "track listing returned status {}",
                status.as_u16()
            )));
        }

        let tracks: Vec<TrackDto> = response
            .json()
            .await
            .map_err(|e| ContentError::InvalidResponse(e.to_string()))?;
        Ok(tracks.into_iter().map(Track::from).collect())
    }

    async fn track_audio_url(
        &self,
        reciter: &ReciterId,
        track: TrackId,
    ) -> Result<String, ContentError> {
        Ok(track_audio_url(&self.audio_base, reciter, track).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn provider(content_base: &str) -> HttpContentProvider {
        let config = HttpClientConfig::new().with_timeout(Duration::from_secs(2));
        HttpContentProvider::new(&config, content_base, "https://cdn.test/audio").unwrap()
    }

    #[test]
    fn dto_maps_to_track() {
        let dtos: Vec<TrackDto> =
            serde_json::from_str(r#"[{"id": 1, "title": "Al-Fatiha"}, {"id": 2}]"#).unwrap();
        let tracks: Vec<Track> = dtos.into_iter().map(Track::from).collect();

        assert_eq!(tracks[0].id, TrackId(1));
        assert_eq!(tracks[0].title.as_deref(), Some("Al-Fatiha"));
        assert_eq!(tracks[1].title, None);
    }

    #[tokio::test]
    async fn audio_url_needs_no_request() {
        let provider = provider("http://127.0.0.1:65431");
        let url = provider
            .track_audio_url(&ReciterId::from("Q"), TrackId(7))
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.test/audio/Q/007.mp3");
    }

    #[tokio::test]
    async fn unreachable_listing_is_unavailable() {
        // Nothing listens on this port.
        let provider = provider("http://127.0.0.1:65431");
        let err = provider
            .list_tracks(&ReciterId::from("Q"))
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::Unavailable(_)));
    }
}
