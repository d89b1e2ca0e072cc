//! Job orchestration: the full lifecycle of a single run.

use crate::error::{Error, ManifestError, Result};
use crate::manifest::select_range;
use crate::retry::retry_fixed;
use crate::store::remove_if_exists;
use crate::types::{Event, JobStatus};
use std::path::Path;
use std::sync::atomic::Ordering;
use tracing::{error, info, warn};

use super::HlsJob;
use super::cleanup::cleanup;
use super::merge::{MergeOutcome, merge_segments};
use super::pool::fetch_all;

impl HlsJob {
    /// Run the job to a terminal state
    ///
    /// Phases:
    /// 1. Validate configuration and move to `running`
    /// 2. Resolve the playlist and select the index range
    /// 3. Fetch segments through the bounded pool
    /// 4. Merge artifacts in index order (if `merge_segments`)
    /// 5. Remux the merged file (if `remux`)
    /// 6. Complete
    ///
    /// Between phases the job waits while paused. Returns
    /// `Ok(JobStatus::Completed)` or `Ok(JobStatus::Canceled)`; any failure
    /// moves the job to `error`, runs cleanup, and is returned as `Err`.
    /// A job runs at most once; a second call fails with
    /// [`Error::InvalidState`].
    pub async fn run(&self) -> Result<JobStatus> {
        let current = self.status();
        if current != JobStatus::Pending {
            return Err(Error::InvalidState {
                operation: "start".to_string(),
                current_state: current.to_string(),
            });
        }

        // Phase 1: validation happens before the job is considered running
        if let Err(e) = self.prepare().await {
            error!(error = %e, "job configuration rejected");
            self.state.fail(&e);
            return Err(e);
        }
        self.state.start()?;
        info!(
            manifest = %self.manifest_url,
            output = ?self.output,
            concurrency = self.config.effective_concurrency(),
            "job started"
        );

        if let Err(e) = self.execute().await {
            error!(error = %e, code = e.error_code(), "job failed");
            self.state.fail(&e);
            cleanup(self).await;
            return Err(e);
        }

        // Phase 6: a pause that lands here holds completion until resume
        while self.state.wait_runnable().await == JobStatus::Running {
            if self.state.complete() {
                info!(
                    output = ?self.output,
                    segments = self.completed_segments(),
                    "job completed"
                );
                return Ok(JobStatus::Completed);
            }
        }

        cleanup(self).await;
        Ok(self.status())
    }

    async fn prepare(&self) -> Result<()> {
        if self.config.remux && !self.config.merge_segments {
            return Err(Error::config(
                "remux requires merge_segments to be enabled",
                "remux",
            ));
        }

        if let Some(parent) = self.output.parent()
            && !parent.as_os_str().is_empty()
            && !tokio::fs::try_exists(parent).await.unwrap_or(false)
        {
            return Err(Error::config(
                format!("output directory does not exist: {}", parent.display()),
                "output",
            ));
        }

        self.store.ensure_dir().await.map_err(|e| {
            Error::config(
                format!(
                    "cannot create segments directory {}: {}",
                    self.store.dir().display(),
                    e
                ),
                "segments_dir",
            )
        })
    }

    async fn execute(&self) -> Result<()> {
        // Phase 2: playlist
        let segments = self
            .collaborators
            .resolver
            .resolve(&self.manifest_url)
            .await?;
        let segments = select_range(segments, self.config.start_index, self.config.end_index);
        if segments.is_empty() {
            return Err(ManifestError::Empty.into());
        }
        self.ledger.reset(&segments).await;
        info!(total = segments.len(), "playlist resolved");

        // Phase 3: fetch
        fetch_all(self, &segments).await?;

        if !self.config.merge_segments {
            return Ok(());
        }

        // Phase 4: merge
        if !self.hold_between_phases().await {
            return Ok(());
        }
        let merge_target = if self.config.remux {
            self.store.merged_path()
        } else {
            self.output.to_path_buf()
        };
        if merge_segments(self, &merge_target, true).await? == MergeOutcome::Aborted {
            return Ok(());
        }

        if !self.config.remux {
            self.delivered.store(true, Ordering::SeqCst);
            return Ok(());
        }

        // Phase 5: remux
        if !self.hold_between_phases().await {
            return Ok(());
        }
        self.remux(&merge_target).await
    }

    /// Wait out a pause; false if the job ended meanwhile
    async fn hold_between_phases(&self) -> bool {
        self.state.wait_runnable().await == JobStatus::Running
    }

    async fn remux(&self, intermediate: &Path) -> Result<()> {
        let remuxer = &self.collaborators.remuxer;
        info!(tool = remuxer.name(), input = ?intermediate, output = ?self.output, "remuxing");

        let result = tokio::select! {
            result = remuxer.remux(intermediate, &self.output) => Some(result),
            _ = self.state.cancel_token().cancelled() => None,
        };

        let Some(result) = result else {
            // Dropping the remux future killed the child; whatever it wrote is partial
            self.discard_output().await;
            return Ok(());
        };

        if let Err(e) = result {
            self.discard_output().await;
            return Err(e.into());
        }
        self.delivered.store(true, Ordering::SeqCst);

        self.state.emit(Event::Converted {
            output: self.output.to_path_buf(),
        });

        let deleted = retry_fixed(&self.config.delete_retry, || remove_if_exists(intermediate)).await;
        if let Err(e) = deleted {
            warn!(path = ?intermediate, error = %e, "failed to delete merge intermediate");
        }

        Ok(())
    }

    async fn discard_output(&self) {
        if let Err(e) = remove_if_exists(&self.output).await {
            warn!(path = ?self.output, error = %e, "failed to remove partial output");
        }
    }
}
