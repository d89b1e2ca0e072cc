//! Cleanup after a canceled or failed run

use crate::store::remove_if_exists;
use std::path::Path;
use std::sync::atomic::Ordering;
use tracing::{debug, info, warn};

use super::HlsJob;

/// Remove everything the run left on disk
///
/// Deletes every recorded artifact (reused ones included), the merge
/// intermediate when remuxing, and the final output if this run had already
/// written it before being canceled. Failures are logged as warnings and never
/// propagate: cleanup must not mask the error that triggered it.
pub(super) async fn cleanup(job: &HlsJob) {
    if !job.config.clean {
        debug!("clean disabled, keeping segment artifacts");
        return;
    }

    let artifacts = job.ledger.artifacts().await;
    let mut removed = 0usize;
    for artifact in &artifacts {
        if remove_logged(&artifact.path).await {
            removed += 1;
        }
    }

    if job.config.remux {
        remove_logged(&job.store.merged_path()).await;
    }

    if job.delivered.load(Ordering::SeqCst) && remove_logged(&job.output).await {
        debug!(output = ?job.output, "removed output of canceled run");
    }

    info!(
        removed,
        recorded = artifacts.len(),
        dir = ?job.store.dir(),
        "cleaned up segment artifacts"
    );
}

async fn remove_logged(path: &Path) -> bool {
    match remove_if_exists(path).await {
        Ok(()) => true,
        Err(e) => {
            warn!(path = ?path, error = %e, "failed to remove file during cleanup");
            false
        }
    }
}
