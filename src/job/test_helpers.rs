//! Shared fakes for exercising jobs without a network or ffmpeg.

use crate::config::JobConfig;
use crate::error::{ManifestError, RemuxError, TransportError};
use crate::job::HlsJob;
use crate::manifest::ManifestResolver;
use crate::remux::Remuxer;
use crate::transport::SegmentFetcher;
use crate::types::{Event, JobStatus, SegmentRef};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{TempDir, tempdir};
use tokio::sync::{Semaphore, broadcast};

/// Base URL of fake segments; segment `i` lives at `{BASE}/seg{i}.ts`
pub(crate) const BASE: &str = "http://media.test/vod";

pub(crate) fn segment_url(index: usize) -> String {
    format!("{BASE}/seg{index}.ts")
}

/// In-memory fetcher with per-segment failures, delays and an optional gate
///
/// Clones share call counters, so a test can keep one clone for assertions.
#[derive(Clone, Default)]
pub(crate) struct FakeFetcher {
    bodies: Vec<Vec<u8>>,
    failures: HashMap<usize, u16>,
    delays: HashMap<usize, Duration>,
    gate: Option<Arc<Semaphore>>,
    started: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
    fetched: Arc<Mutex<Vec<usize>>>,
}

impl FakeFetcher {
    pub(crate) fn with_segments(bodies: &[&[u8]]) -> Self {
        Self {
            bodies: bodies.iter().map(|b| b.to_vec()).collect(),
            ..Default::default()
        }
    }

    /// Segments of `size` bytes each, every byte equal to the segment index
    pub(crate) fn with_sized_segments(sizes: &[usize]) -> Self {
        Self {
            bodies: sizes
                .iter()
                .enumerate()
                .map(|(i, &size)| vec![i as u8; size])
                .collect(),
            ..Default::default()
        }
    }

    /// Answer segment `index` with HTTP `status`
    pub(crate) fn fail(mut self, index: usize, status: u16) -> Self {
        self.failures.insert(index, status);
        self
    }

    pub(crate) fn delay(mut self, index: usize, delay: Duration) -> Self {
        self.delays.insert(index, delay);
        self
    }

    /// Hold every fetch until the returned semaphore hands out a permit
    pub(crate) fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub(crate) fn segments(&self) -> Vec<SegmentRef> {
        (0..self.bodies.len())
            .map(|i| SegmentRef::new(i, segment_url(i)))
            .collect()
    }

    /// All bodies concatenated in index order
    pub(crate) fn expected_output(&self) -> Vec<u8> {
        self.bodies.concat()
    }

    pub(crate) fn body(&self, index: usize) -> &[u8] {
        &self.bodies[index]
    }

    pub(crate) fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub(crate) fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    /// Indices in the order their fetches started
    pub(crate) fn fetched(&self) -> Vec<usize> {
        self.fetched.lock().unwrap().clone()
    }

    fn index_of(&self, url: &str) -> Option<usize> {
        url.strip_prefix(BASE)?
            .strip_prefix("/seg")?
            .strip_suffix(".ts")?
            .parse()
            .ok()
    }
}

#[async_trait]
impl SegmentFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, TransportError> {
        let index = self.index_of(url);
        self.started.fetch_add(1, Ordering::SeqCst);
        if let Some(i) = index {
            self.fetched.lock().unwrap().push(i);
        }

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if let Some(delay) = index.and_then(|i| self.delays.get(&i)) {
            tokio::time::sleep(*delay).await;
        }

        let result = match index {
            Some(i) if self.failures.contains_key(&i) => Err(TransportError::Status {
                url: url.to_string(),
                status: self.failures[&i],
            }),
            Some(i) if i < self.bodies.len() => Ok(Bytes::from(self.bodies[i].clone())),
            _ => Err(TransportError::Status {
                url: url.to_string(),
                status: 404,
            }),
        };
        self.finished.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// Resolver returning a fixed segment list (or a fixed error)
pub(crate) struct StaticResolver {
    result: Result<Vec<SegmentRef>, String>,
}

impl StaticResolver {
    pub(crate) fn new(segments: Vec<SegmentRef>) -> Self {
        Self {
            result: Ok(segments),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
        }
    }
}

#[async_trait]
impl ManifestResolver for StaticResolver {
    async fn resolve(&self, _manifest_url: &str) -> Result<Vec<SegmentRef>, ManifestError> {
        self.result.clone().map_err(ManifestError::Parse)
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum RemuxMode {
    /// Copy input to output
    Copy,
    /// Write a partial output, then exit non-zero
    Fail,
    /// Never finish (until the future is dropped)
    Hang,
}

/// Remuxer stand-in that never spawns a process
#[derive(Clone)]
pub(crate) struct FakeRemuxer {
    mode: RemuxMode,
    calls: Arc<AtomicUsize>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeRemuxer {
    pub(crate) fn new(mode: RemuxMode) -> Self {
        Self {
            mode,
            calls: Arc::new(AtomicUsize::new(0)),
            gate: None,
        }
    }

    /// Each remux waits for one permit before doing its work
    pub(crate) fn gated(mode: RemuxMode) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let remuxer = Self {
            gate: Some(gate.clone()),
            ..Self::new(mode)
        };
        (remuxer, gate)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Remuxer for FakeRemuxer {
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), RemuxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        match self.mode {
            RemuxMode::Copy => {
                tokio::fs::copy(input, output)
                    .await
                    .map_err(|source| RemuxError::Spawn {
                        tool: "fake".into(),
                        source,
                    })?;
                Ok(())
            }
            RemuxMode::Fail => {
                tokio::fs::write(output, b"partial").await.ok();
                Err(RemuxError::Failed {
                    code: Some(1),
                    stderr: "Invalid data found when processing input".into(),
                })
            }
            RemuxMode::Hang => {
                tokio::fs::write(output, b"partial").await.ok();
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Test config with its segment store inside `dir`
pub(crate) fn test_config(dir: &TempDir, config: JobConfig) -> JobConfig {
    JobConfig {
        segments_dir: dir.path().join("segments"),
        ..config
    }
}

/// Build a job over `fetcher`'s segments with a copying remuxer.
/// Returns the job and the tempdir (which must be kept alive).
pub(crate) fn job_with(fetcher: &FakeFetcher, config: JobConfig) -> (HlsJob, TempDir) {
    job_with_remuxer(fetcher, FakeRemuxer::new(RemuxMode::Copy), config)
}

pub(crate) fn job_with_remuxer(
    fetcher: &FakeFetcher,
    remuxer: FakeRemuxer,
    config: JobConfig,
) -> (HlsJob, TempDir) {
    let dir = tempdir().unwrap();
    let config = test_config(&dir, config);
    let job = HlsJob::builder(
        format!("{BASE}/index.m3u8"),
        dir.path().join("video.ts"),
        config,
    )
    .resolver(Arc::new(StaticResolver::new(fetcher.segments())))
    .fetcher(Arc::new(fetcher.clone()))
    .remuxer(Arc::new(remuxer))
    .build()
    .unwrap();
    (job, dir)
}

/// Poll `condition` until it holds, failing the test after a few seconds
pub(crate) async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Wait for a status with a timeout
pub(crate) async fn wait_for(job: &HlsJob, status: JobStatus) {
    tokio::time::timeout(Duration::from_secs(5), job.wait_for_status(|s| s == status))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {status}"));
}

/// Everything received so far
pub(crate) fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Names of files currently in `dir` (empty if it does not exist)
pub(crate) fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
