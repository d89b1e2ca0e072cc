//! The download job, split into focused submodules.
//!
//! - [`state`] - Status transitions and the pause gate
//! - [`control`] - Caller-facing pause/resume/cancel
//! - [`pool`] - Bounded concurrent segment fetching
//! - [`merge`] - Ordered concatenation of artifacts
//! - [`cleanup`] - Best-effort removal after cancel or failure
//! - [`orchestration`] - The `run` lifecycle tying the phases together

mod cleanup;
mod control;
mod ledger;
mod merge;
mod orchestration;
mod pool;
mod state;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::JobConfig;
use crate::error::{Error, Result};
use crate::manifest::{HttpManifestResolver, ManifestResolver};
use crate::remux::{FfmpegRemuxer, Remuxer};
use crate::store::SegmentStore;
use crate::transport::{HttpFetcher, SegmentFetcher};
use crate::types::{Event, JobStatus, SegmentArtifact};
use ledger::SegmentLedger;
use state::JobState;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::sync::broadcast;

/// Capacity of the event channel; slow subscribers lag rather than block the job
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Collaborators the job calls out to
#[derive(Clone)]
pub(crate) struct Collaborators {
    pub(crate) resolver: Arc<dyn ManifestResolver>,
    pub(crate) fetcher: Arc<dyn SegmentFetcher>,
    pub(crate) remuxer: Arc<dyn Remuxer>,
}

/// A single HLS download (cloneable - all fields are Arc-wrapped)
///
/// Clones share state, so one clone can drive [`run`](Self::run) while another
/// pauses, resumes or cancels it.
#[derive(Clone)]
pub struct HlsJob {
    pub(crate) manifest_url: Arc<str>,
    pub(crate) output: Arc<Path>,
    pub(crate) config: Arc<JobConfig>,
    pub(crate) store: SegmentStore,
    pub(crate) state: Arc<JobState>,
    pub(crate) ledger: Arc<SegmentLedger>,
    /// Set once this run has written the final output file
    pub(crate) delivered: Arc<AtomicBool>,
    pub(crate) collaborators: Collaborators,
}

impl HlsJob {
    /// Create a job with the HTTP resolver, HTTP fetcher and ffmpeg remuxer
    ///
    /// Fails with [`Error::Config`] if the HTTP client cannot be built from
    /// `config` (invalid header or proxy).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use hls_dl::{HlsJob, JobConfig};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> hls_dl::Result<()> {
    /// let job = HlsJob::new(
    ///     "https://example.com/stream/index.m3u8",
    ///     "video.ts",
    ///     JobConfig::default(),
    /// )?;
    /// let status = job.run().await?;
    /// println!("finished: {status}");
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(
        manifest_url: impl Into<String>,
        output: impl Into<PathBuf>,
        config: JobConfig,
    ) -> Result<Self> {
        Self::builder(manifest_url, output, config).build()
    }

    /// Start building a job with custom collaborators
    pub fn builder(
        manifest_url: impl Into<String>,
        output: impl Into<PathBuf>,
        config: JobConfig,
    ) -> HlsJobBuilder {
        HlsJobBuilder {
            manifest_url: manifest_url.into(),
            output: output.into(),
            config,
            resolver: None,
            fetcher: None,
            remuxer: None,
        }
    }

    /// Current status
    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    /// Number of segments selected for this job (0 until the playlist is resolved)
    pub fn total_segments(&self) -> usize {
        self.ledger.total()
    }

    /// Segments completed (fetched or reused) while the job was live
    pub fn completed_segments(&self) -> usize {
        self.ledger.completed()
    }

    /// Segments materialized by this job, in index order
    pub async fn artifacts(&self) -> Vec<SegmentArtifact> {
        self.ledger.artifacts().await
    }

    /// Playlist URL
    pub fn manifest_url(&self) -> &str {
        &self.manifest_url
    }

    /// Final output path
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Job configuration
    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Directory holding this job's segment artifacts
    pub fn segments_dir(&self) -> &Path {
        self.store.dir()
    }

    /// Subscribe to job events
    ///
    /// Only events emitted after this call are received.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.state.event_tx().subscribe()
    }

    /// Wait until the status satisfies `predicate` and return that status
    pub async fn wait_for_status<F>(&self, mut predicate: F) -> JobStatus
    where
        F: FnMut(JobStatus) -> bool,
    {
        let mut rx = self.state.watch();
        match rx.wait_for(|s| predicate(*s)).await {
            Ok(status) => *status,
            Err(_) => self.status(),
        }
    }
}

/// Builder for [`HlsJob`] with pluggable resolver, fetcher and remuxer
///
/// Anything left unset falls back to the HTTP/ffmpeg implementations.
pub struct HlsJobBuilder {
    manifest_url: String,
    output: PathBuf,
    config: JobConfig,
    resolver: Option<Arc<dyn ManifestResolver>>,
    fetcher: Option<Arc<dyn SegmentFetcher>>,
    remuxer: Option<Arc<dyn Remuxer>>,
}

impl HlsJobBuilder {
    /// Use a custom playlist resolver
    pub fn resolver(mut self, resolver: Arc<dyn ManifestResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Use a custom segment fetcher
    ///
    /// The default resolver also downloads the playlist through this fetcher.
    pub fn fetcher(mut self, fetcher: Arc<dyn SegmentFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Use a custom remuxer
    pub fn remuxer(mut self, remuxer: Arc<dyn Remuxer>) -> Self {
        self.remuxer = Some(remuxer);
        self
    }

    /// Build the job
    pub fn build(self) -> Result<HlsJob> {
        if self.manifest_url.trim().is_empty() {
            return Err(Error::config("manifest URL is empty", "manifest_url"));
        }
        if self.output.as_os_str().is_empty() {
            return Err(Error::config("output path is empty", "output"));
        }

        let fetcher: Arc<dyn SegmentFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::from_config(&self.config)?),
        };
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(HttpManifestResolver::new(fetcher.clone())));
        let remuxer = self.remuxer.unwrap_or_else(|| {
            Arc::new(FfmpegRemuxer::from_option(self.config.ffmpeg_path.as_deref()))
        });

        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let store = SegmentStore::new(&self.config.segments_dir, &self.config.segment_suffix);

        Ok(HlsJob {
            manifest_url: Arc::from(self.manifest_url),
            output: Arc::from(self.output),
            config: Arc::new(self.config),
            store,
            state: Arc::new(JobState::new(event_tx)),
            ledger: Arc::new(SegmentLedger::default()),
            delivered: Arc::new(AtomicBool::new(false)),
            collaborators: Collaborators {
                resolver,
                fetcher,
                remuxer,
            },
        })
    }
}
