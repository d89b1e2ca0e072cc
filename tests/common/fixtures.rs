//! Playlist fixtures and a wiremock-backed HLS origin

use hls_dl::{HlsJob, JobConfig, RetryConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Render a VOD media playlist listing `uris` in order
pub fn media_playlist(uris: &[String]) -> String {
    let mut playlist = String::from(
        "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:6\n#EXT-X-MEDIA-SEQUENCE:0\n",
    );
    for uri in uris {
        playlist.push_str("#EXTINF:6.0,\n");
        playlist.push_str(uri);
        playlist.push('\n');
    }
    playlist.push_str("#EXT-X-ENDLIST\n");
    playlist
}

/// Master playlist pointing at two renditions
pub const MASTER_PLAYLIST: &str = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360
360p/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=2400000,RESOLUTION=1280x720
720p/index.m3u8
";

/// Deterministic segment body: `size` bytes derived from `index`
pub fn segment_body(index: usize, size: usize) -> Vec<u8> {
    (0..size).map(|i| ((index * 31 + i) % 251) as u8).collect()
}

/// An HLS origin serving `/vod/index.m3u8` plus one route per segment
pub struct Origin {
    pub server: MockServer,
    pub segments: Vec<Vec<u8>>,
}

impl Origin {
    /// Serve segments with the given sizes at relative URIs `seg{i}.ts`
    pub async fn start(sizes: &[usize]) -> Self {
        let server = MockServer::start().await;
        let segments: Vec<_> = sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| segment_body(i, size))
            .collect();

        let uris: Vec<_> = (0..segments.len()).map(|i| format!("seg{i}.ts")).collect();
        Mock::given(method("GET"))
            .and(path("/vod/index.m3u8"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/vnd.apple.mpegurl")
                    .set_body_string(media_playlist(&uris)),
            )
            .mount(&server)
            .await;

        Self { server, segments }
    }

    /// Serve every segment normally
    pub async fn serve_all(&self) {
        for i in 0..self.segments.len() {
            self.serve(i, None).await;
        }
    }

    /// Serve segment `index`, optionally after `delay`
    pub async fn serve(&self, index: usize, delay: Option<Duration>) {
        let mut response = ResponseTemplate::new(200).set_body_bytes(self.segments[index].clone());
        if let Some(delay) = delay {
            response = response.set_delay(delay);
        }
        Mock::given(method("GET"))
            .and(path(format!("/vod/seg{index}.ts")))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Answer segment `index` with `status`
    pub async fn fail(&self, index: usize, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/vod/seg{index}.ts")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    pub fn playlist_url(&self) -> String {
        format!("{}/vod/index.m3u8", self.server.uri())
    }

    /// Every segment body concatenated in playlist order
    pub fn expected_output(&self) -> Vec<u8> {
        self.segments.concat()
    }
}

/// Config with its segment store under `dir` and a retry budget fit for tests
pub fn test_config(dir: &TempDir) -> JobConfig {
    JobConfig {
        segments_dir: dir.path().join("segments"),
        retry: RetryConfig {
            max_attempts: 1,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            backoff_multiplier: 2.0,
            jitter: false,
        },
        ..Default::default()
    }
}

/// Job downloading `origin`'s playlist into `dir/video.ts`
pub fn http_job(origin: &Origin, dir: &TempDir, config: JobConfig) -> HlsJob {
    HlsJob::new(origin.playlist_url(), output_path(dir.path()), config)
        .expect("job should build")
}

/// Where [`http_job`] writes its output
pub fn output_path(dir: &Path) -> PathBuf {
    dir.join("video.ts")
}
