//! Caller-facing lifecycle control: pause, resume, cancel.
//!
//! All three are idempotent and never fail; the returned flag says whether the
//! call changed the status. Calls from a state where they do not apply
//! (including any terminal state) are no-ops.

use tracing::info;

use super::HlsJob;

impl HlsJob {
    /// Suspend intake of new segment fetches
    ///
    /// Fetches already in flight run to completion and are counted; queued
    /// segments wait until [`resume`](Self::resume). Only valid while running.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use hls_dl::*;
    /// # async fn example(job: HlsJob) {
    /// if job.pause() {
    ///     // ... later
    ///     job.resume();
    /// }
    /// # }
    /// ```
    pub fn pause(&self) -> bool {
        let changed = self.state.pause();
        if changed {
            info!(
                manifest = %self.manifest_url,
                completed = self.completed_segments(),
                total = self.total_segments(),
                "job paused"
            );
        }
        changed
    }

    /// Release a paused job
    pub fn resume(&self) -> bool {
        let changed = self.state.resume();
        if changed {
            info!(manifest = %self.manifest_url, "job resumed");
        }
        changed
    }

    /// Cancel a running or paused job
    ///
    /// No new fetch starts after this returns. In-flight fetches finish but no
    /// longer count as progress. Once the run has drained, and if `clean` is
    /// set, every artifact the job recorded is deleted.
    pub fn cancel(&self) -> bool {
        let changed = self.state.cancel();
        if changed {
            info!(
                manifest = %self.manifest_url,
                completed = self.completed_segments(),
                "job canceled"
            );
        }
        changed
    }
}
