//! # hls-dl
//!
//! Library for downloading HLS (`.m3u8`) streams into a single media file.
//!
//! A job resolves a media playlist, fetches its segments with bounded
//! concurrency, concatenates them in playlist order and can optionally remux
//! the result with ffmpeg. Jobs can be paused, resumed and canceled while
//! they run, and report progress through an event stream.
//!
//! ## Quick Start
//!
//! ```no_run
//! use hls_dl::{Event, HlsJob, JobConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = JobConfig {
//!         concurrency: 8,
//!         remux: true,
//!         ..Default::default()
//!     };
//!
//!     let job = HlsJob::new("https://example.com/stream/index.m3u8", "video.mp4", config)?;
//!
//!     // Subscribe to events
//!     let mut events = job.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let Event::Progress(p) = event {
//!                 println!("{}/{}", p.completed, p.total);
//!             }
//!         }
//!     });
//!
//!     let status = job.run().await?;
//!     println!("job finished: {status}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Download job (decomposed into focused submodules)
pub mod job;
/// Playlist resolution
pub mod manifest;
/// External remux step
pub mod remux;
/// Retry logic with exponential backoff
pub mod retry;
/// On-disk segment store
pub mod store;
/// HTTP transport
pub mod transport;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{DeleteRetryConfig, JobConfig, ProxyConfig, RetryConfig};
pub use error::{Error, ManifestError, RemuxError, Result, TransportError};
pub use job::{HlsJob, HlsJobBuilder};
pub use manifest::{HttpManifestResolver, ManifestResolver};
pub use remux::{FfmpegRemuxer, Remuxer};
pub use transport::{HttpFetcher, SegmentFetcher};
pub use types::{Event, JobStatus, Progress, SegmentArtifact, SegmentRef};

/// Run a job, canceling it on SIGTERM or SIGINT (Ctrl+C)
///
/// Returns once the job reaches a terminal state. A signal cancels the job;
/// the run then drains in-flight fetches and cleans up before this returns
/// `Ok(JobStatus::Canceled)`.
///
/// # Example
///
/// ```no_run
/// use hls_dl::{HlsJob, JobConfig, run_until_signal};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let job = HlsJob::new("https://example.com/index.m3u8", "video.ts", JobConfig::default())?;
///
///     // Run with automatic signal handling
///     let status = run_until_signal(job).await?;
///     println!("{status}");
///
///     Ok(())
/// }
/// ```
pub async fn run_until_signal(job: HlsJob) -> Result<JobStatus> {
    let run = job.run();
    tokio::pin!(run);

    tokio::select! {
        result = &mut run => result,
        _ = wait_for_signal() => {
            job.cancel();
            run.await
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM signal"),
                _ = sigint.recv() => tracing::info!("Received SIGINT signal (Ctrl+C)"),
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
