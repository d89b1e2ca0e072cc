//! Ordered concatenation of segment artifacts into one file

use crate::error::{Error, Result};
use crate::store::remove_if_exists;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

use super::HlsJob;

/// How a merge ended
#[derive(Debug, PartialEq, Eq)]
pub(super) enum MergeOutcome {
    /// Every artifact was appended
    Merged,
    /// The job was canceled or failed mid-merge
    Aborted,
}

/// Concatenate every slot's artifact into `target` in ascending index order
///
/// With `delete_source`, each source is deleted right after it has been
/// appended. Pausing does not stop a merge in progress; cancel and error do.
/// A slot with no artifact on disk is a [`Error::MergeGap`].
///
/// When a merge stops early the partial target is removed if `clean` is set.
/// Otherwise it is flushed and kept, since it is the only copy of the sources
/// already appended and deleted.
pub(super) async fn merge_segments(
    job: &HlsJob,
    target: &Path,
    delete_source: bool,
) -> Result<MergeOutcome> {
    let plan = job.ledger.plan().await;
    info!(segments = plan.len(), target = ?target, "merging segments");

    let file = File::create(target).await?;
    let mut writer = BufWriter::new(file);
    let mut consumed = 0usize;

    for (index, recorded) in plan {
        if job.state.status().is_terminal() {
            abandon(job, writer, target, consumed).await;
            return Ok(MergeOutcome::Aborted);
        }

        let source = recorded.unwrap_or_else(|| job.store.segment_path(index));
        if let Err(e) = append(&mut writer, &source, index).await {
            abandon(job, writer, target, consumed).await;
            return Err(e);
        }

        if delete_source {
            match remove_if_exists(&source).await {
                Ok(()) => consumed += 1,
                Err(e) => {
                    warn!(index, path = ?source, error = %e, "failed to delete merged segment")
                }
            }
        }
    }

    writer.flush().await?;
    writer.into_inner().sync_all().await?;

    debug!(target = ?target, "merge finished");
    Ok(MergeOutcome::Merged)
}

async fn append(writer: &mut BufWriter<File>, source: &Path, index: usize) -> Result<()> {
    let mut input = match File::open(source).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::MergeGap {
                index,
                path: PathBuf::from(source),
            });
        }
        Err(e) => return Err(e.into()),
    };
    tokio::io::copy(&mut input, writer).await?;
    Ok(())
}

/// Dispose of a merge that stopped early
///
/// `consumed` counts sources that exist only inside the partial target.
async fn abandon(job: &HlsJob, mut writer: BufWriter<File>, target: &Path, consumed: usize) {
    if !job.config.clean && consumed > 0 {
        match writer.flush().await {
            Ok(()) => {
                info!(target = ?target, consumed, "clean disabled, keeping partial merge output");
                return;
            }
            Err(e) => warn!(path = ?target, error = %e, "failed to flush partial merge output"),
        }
    }

    drop(writer);
    if let Err(e) = remove_if_exists(target).await {
        warn!(path = ?target, error = %e, "failed to remove partial merge output");
    }
}
