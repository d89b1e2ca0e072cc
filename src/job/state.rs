//! Job status transitions and the pause gate

use crate::error::{Error, Result};
use crate::types::{Event, JobStatus};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

/// Owns the job status and the signals derived from it
///
/// Every transition runs inside the watch channel's write lock, and the matching
/// event is emitted from within that lock, so observers see events in
/// transition order. The cancellation token fires on the first transition into
/// `canceled` or `error` and stops intake of new segment fetches.
pub(crate) struct JobState {
    status: watch::Sender<JobStatus>,
    cancel_token: CancellationToken,
    event_tx: broadcast::Sender<Event>,
}

impl JobState {
    pub(crate) fn new(event_tx: broadcast::Sender<Event>) -> Self {
        let (status, _rx) = watch::channel(JobStatus::Pending);
        Self {
            status,
            cancel_token: CancellationToken::new(),
            event_tx,
        }
    }

    pub(crate) fn status(&self) -> JobStatus {
        *self.status.borrow()
    }

    pub(crate) fn watch(&self) -> watch::Receiver<JobStatus> {
        self.status.subscribe()
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    pub(crate) fn event_tx(&self) -> &broadcast::Sender<Event> {
        &self.event_tx
    }

    pub(crate) fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }

    /// Emit the event built by `event` unless the job is already terminal
    ///
    /// Runs under the status lock, so it cannot interleave with a transition.
    /// Returns whether the event was emitted.
    pub(crate) fn emit_while_live(&self, event: impl FnOnce() -> Event) -> bool {
        let mut live = false;
        self.status.send_if_modified(|status| {
            if !status.is_terminal() {
                live = true;
                self.event_tx.send(event()).ok();
            }
            false
        });
        live
    }

    /// Move to `to` if the current status is one of `from`, emitting `event`
    fn transition(&self, from: &[JobStatus], to: JobStatus, event: Event) -> bool {
        self.status.send_if_modified(|status| {
            if !from.contains(status) {
                return false;
            }
            *status = to;
            self.event_tx.send(event).ok();
            true
        })
    }

    /// pending -> running
    pub(crate) fn start(&self) -> Result<()> {
        if self.transition(&[JobStatus::Pending], JobStatus::Running, Event::Started) {
            Ok(())
        } else {
            Err(Error::InvalidState {
                operation: "start".to_string(),
                current_state: self.status().to_string(),
            })
        }
    }

    /// running -> paused
    pub(crate) fn pause(&self) -> bool {
        self.transition(&[JobStatus::Running], JobStatus::Paused, Event::Paused)
    }

    /// paused -> running
    pub(crate) fn resume(&self) -> bool {
        self.transition(&[JobStatus::Paused], JobStatus::Running, Event::Resumed)
    }

    /// running | paused -> canceled
    pub(crate) fn cancel(&self) -> bool {
        let changed = self.transition(
            &[JobStatus::Running, JobStatus::Paused],
            JobStatus::Canceled,
            Event::Canceled,
        );
        if changed {
            self.cancel_token.cancel();
        }
        changed
    }

    /// any non-terminal -> error
    pub(crate) fn fail(&self, error: &Error) -> bool {
        let changed = self.transition(
            &[JobStatus::Pending, JobStatus::Running, JobStatus::Paused],
            JobStatus::Error,
            Event::Error {
                message: error.to_string(),
            },
        );
        if changed {
            self.cancel_token.cancel();
        }
        changed
    }

    /// running -> completed
    pub(crate) fn complete(&self) -> bool {
        self.transition(&[JobStatus::Running], JobStatus::Completed, Event::Completed)
    }

    /// Wait until the job is not paused and return the status it settled in
    ///
    /// This is the dispatch gate: work only starts when it returns `Running`.
    pub(crate) async fn wait_runnable(&self) -> JobStatus {
        let mut rx = self.status.subscribe();
        match rx.wait_for(|s| *s != JobStatus::Paused).await {
            Ok(status) => *status,
            Err(_) => self.status(),
        }
    }
}
