//! Playlist resolution: turns a media playlist URL into ordered [`SegmentRef`]s

use crate::error::ManifestError;
use crate::transport::SegmentFetcher;
use crate::types::SegmentRef;
use async_trait::async_trait;
use m3u8_rs::Playlist;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Resolves a playlist locator into the ordered list of segments it describes
#[async_trait]
pub trait ManifestResolver: Send + Sync {
    /// Fetch and parse the playlist at `manifest_url`
    async fn resolve(&self, manifest_url: &str) -> Result<Vec<SegmentRef>, ManifestError>;
}

/// Production [`ManifestResolver`] that downloads the playlist over HTTP
///
/// Uses the job's fetcher so the playlist request carries the same headers,
/// proxy and retry policy as segment requests.
pub struct HttpManifestResolver {
    fetcher: Arc<dyn SegmentFetcher>,
}

impl HttpManifestResolver {
    /// Create a resolver that downloads playlists through `fetcher`
    pub fn new(fetcher: Arc<dyn SegmentFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ManifestResolver for HttpManifestResolver {
    async fn resolve(&self, manifest_url: &str) -> Result<Vec<SegmentRef>, ManifestError> {
        let playlist_url = Url::parse(manifest_url).map_err(|e| ManifestError::InvalidUrl {
            url: manifest_url.to_string(),
            reason: e.to_string(),
        })?;

        let body = self
            .fetcher
            .fetch(playlist_url.as_str())
            .await
            .map_err(ManifestError::Fetch)?;

        parse_media_playlist(&playlist_url, &body)
    }
}

/// Parse a media playlist and resolve each segment URI against `playlist_url`
///
/// Absolute segment URIs are kept as-is; relative ones are joined onto the
/// playlist's directory.
pub fn parse_media_playlist(
    playlist_url: &Url,
    content: &[u8],
) -> Result<Vec<SegmentRef>, ManifestError> {
    let playlist = match m3u8_rs::parse_playlist_res(content) {
        Ok(Playlist::MediaPlaylist(pl)) => pl,
        Ok(Playlist::MasterPlaylist(_)) => return Err(ManifestError::MasterPlaylist),
        Err(e) => return Err(ManifestError::Parse(e.to_string())),
    };

    let segments = playlist
        .segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            playlist_url
                .join(&segment.uri)
                .map(|url| SegmentRef::new(index, url.to_string()))
                .map_err(|e| ManifestError::InvalidUrl {
                    url: segment.uri.clone(),
                    reason: e.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        playlist = %playlist_url,
        segments = segments.len(),
        "parsed media playlist"
    );

    Ok(segments)
}

/// Keep the segments whose index lies in `start..=end`
///
/// Either bound may be omitted. Indices are preserved so artifacts keep their
/// playlist-based names across runs with different ranges.
pub fn select_range(
    segments: Vec<SegmentRef>,
    start: Option<usize>,
    end: Option<usize>,
) -> Vec<SegmentRef> {
    let start = start.unwrap_or(0);
    let end = end.unwrap_or(usize::MAX);
    segments
        .into_iter()
        .filter(|s| s.index >= start && s.index <= end)
        .collect()
}
