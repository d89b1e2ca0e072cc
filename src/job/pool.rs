//! Bounded concurrent segment fetching

use crate::error::{Error, Result};
use crate::store::remove_if_exists;
use crate::types::{Event, JobStatus, Progress, SegmentArtifact, SegmentRef};
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use super::HlsJob;

/// Fetch every segment with at most `concurrency` fetches in flight
///
/// Intake stops as soon as the job is canceled or fails; segments already
/// dispatched are allowed to finish. The first fetch or write failure moves
/// the job to `error` immediately and is returned once in-flight work drains.
pub(super) async fn fetch_all(job: &HlsJob, segments: &[SegmentRef]) -> Result<()> {
    let concurrency = job.config.effective_concurrency();
    let token = job.state.cancel_token().clone();

    let results = stream::iter(segments.to_vec().into_iter().enumerate())
        .take_until(token.cancelled_owned())
        .map(|(slot, segment)| {
            let job = job.clone();
            async move { fetch_segment(&job, slot, &segment).await }
        })
        .buffer_unordered(concurrency);
    let mut results = std::pin::pin!(results);

    let mut first_error = None;
    while let Some(result) = results.next().await {
        if let Err(e) = result {
            if first_error.is_none() {
                // Stops intake for the rest of the drain
                job.state.fail(&e);
                first_error = Some(e);
            } else {
                debug!(error = %e, "additional segment failure after job error");
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn fetch_segment(job: &HlsJob, slot: usize, segment: &SegmentRef) -> Result<()> {
    if job.state.wait_runnable().await != JobStatus::Running {
        return Ok(());
    }

    let index = segment.index;

    if job.config.skip_existing_segments && job.store.contains(index).await {
        debug!(index, "segment already on disk, skipping fetch");
        let artifact = SegmentArtifact {
            index,
            path: job.store.segment_path(index),
            skipped: true,
        };
        record(job, slot, artifact).await;
        return Ok(());
    }

    let data = job
        .collaborators
        .fetcher
        .fetch(&segment.url)
        .await
        .map_err(|source| Error::Transport { index, source })?;

    let path = match job.store.write_segment(index, &data).await {
        Ok(path) => path,
        Err(e) => {
            let partial = job.store.segment_path(index);
            if let Err(remove_err) = remove_if_exists(&partial).await {
                warn!(index, error = %remove_err, "failed to remove partial segment");
            }
            return Err(e.into());
        }
    };

    let artifact = SegmentArtifact {
        index,
        path,
        skipped: false,
    };
    record(job, slot, artifact).await;
    Ok(())
}

/// Record an artifact and, while the job is live, count it as progress
///
/// Counting happens under the status lock, so no `Progress` can follow a
/// `Canceled` or `Error` event.
async fn record(job: &HlsJob, slot: usize, artifact: SegmentArtifact) {
    let path = artifact.path.clone();
    let index = artifact.index;

    job.ledger.record(slot, artifact).await;

    let counted = job.state.emit_while_live(|| {
        Event::Progress(Progress {
            path,
            completed: job.ledger.mark_completed(),
            total: job.ledger.total(),
        })
    });
    if !counted {
        debug!(index, "segment finished after job ended, not counted");
    }
}
