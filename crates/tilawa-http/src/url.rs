//! URL construction for the content and audio endpoints.

use tilawa_core::{ReciterId, TrackId};
use url::Url;

use crate::error::{HttpError, HttpResult};

/// Parse `raw` as an http(s) base URL.
pub fn parse_base(raw: &str) -> HttpResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|source| HttpError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    if url.cannot_be_a_base() {
        return Err(HttpError::NotABase(raw.to_string()));
    }
    Ok(url)
}

/// Append `segments` to `base`, percent-encoding each one.
fn join_segments<'a>(base: &Url, segments: impl IntoIterator<Item = &'a str>) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// `{content_base}/reciters/{reciter}/tracks`
pub fn tracks_url(content_base: &Url, reciter: &ReciterId) -> Url {
    join_segments(content_base, ["reciters", reciter.as_str(), "tracks"])
}

/// `{audio_base}/{reciter}/{track:03}.mp3`
pub fn track_audio_url(audio_base: &Url, reciter: &ReciterId, track: TrackId) -> Url {
    let file = format!("{:03}.mp3", track.0);
    join_segments(audio_base, [reciter.as_str(), file.as_str()])
}
