//! Core types for hls-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lifecycle status of a job
///
/// ```text
/// pending -> running <-> paused
///            running | paused -> canceled
///            any non-terminal  -> error
///            running           -> completed
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created, not started yet
    Pending,
    /// Fetching, merging or remuxing
    Running,
    /// Intake of new work suspended by the caller
    Paused,
    /// Canceled by the caller
    Canceled,
    /// Finished successfully
    Completed,
    /// Failed with an unrecoverable error
    Error,
}

impl JobStatus {
    /// Terminal states are absorbing: no transition leaves them
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Canceled | JobStatus::Completed | JobStatus::Error
        )
    }

    /// Lowercase name, as used in events and errors
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Paused => "paused",
            JobStatus::Canceled => "canceled",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One segment resolved from the playlist
///
/// `index` is the segment's position in the playlist and the only ordering key
/// for the merge; fetch completion order is irrelevant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRef {
    /// Zero-based position in the playlist
    pub index: usize,
    /// Absolute segment URL
    pub url: String,
}

impl SegmentRef {
    /// Create a new SegmentRef
    pub fn new(index: usize, url: impl Into<String>) -> Self {
        Self {
            index,
            url: url.into(),
        }
    }
}

/// A segment materialized in the segment store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentArtifact {
    /// Playlist index of the segment
    pub index: usize,
    /// Location of the artifact on disk
    pub path: PathBuf,
    /// True when the artifact already existed and no fetch was made
    pub skipped: bool,
}

/// Progress observation emitted once per completed (or skipped) segment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Artifact that just completed
    pub path: PathBuf,
    /// Segments completed so far
    pub completed: usize,
    /// Segments in this job
    pub total: usize,
}

/// Event emitted during the job lifecycle
///
/// Events are notifications only; the job's [`JobStatus`] is the source of
/// truth for success or failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Job started
    Started,

    /// A segment was fetched or reused
    Progress(Progress),

    /// Intake of new segments suspended
    Paused,

    /// Intake of new segments resumed
    Resumed,

    /// Job canceled by the caller
    Canceled,

    /// Job failed
    Error {
        /// Human-readable diagnostic
        message: String,
    },

    /// Job finished successfully
    Completed,

    /// Merged file remuxed into the final output
    Converted {
        /// Final output path
        output: PathBuf,
    },
}
