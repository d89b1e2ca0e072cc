//! Error types for hls-dl
//!
//! Every fatal condition of a job maps to one [`Error`] variant. The job funnels
//! all of them through a single `error` transition, so the variant tells the
//! caller which phase failed:
//! - [`Error::Config`] - invalid configuration or destination at start
//! - [`Error::Manifest`] - playlist unreachable or unparsable
//! - [`Error::Transport`] - a segment's terminal fetch failure
//! - [`Error::MergeGap`] - an artifact missing at merge time
//! - [`Error::Remux`] - the external remux tool failed

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for hls-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for hls-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "segments_dir")
        key: Option<String>,
    },

    /// Playlist could not be fetched or parsed
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// A segment fetch failed after the transport exhausted its retries
    #[error("segment {index} failed: {source}")]
    Transport {
        /// Manifest index of the failed segment
        index: usize,
        /// Underlying transport failure
        #[source]
        source: TransportError,
    },

    /// An expected segment artifact was missing when merging
    #[error("segment {index} is missing at {path}")]
    MergeGap {
        /// Manifest index of the missing segment
        index: usize,
        /// Where the artifact was expected
        path: PathBuf,
    },

    /// External remux tool failed
    #[error("remux error: {0}")]
    Remux(#[from] RemuxError),

    /// Operation not allowed in the job's current state
    #[error("cannot {operation} job in state {current_state}")]
    InvalidState {
        /// The operation that was attempted (e.g., "start")
        operation: String,
        /// The state that prevents the operation
        current_state: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::Config`] tied to a config key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Manifest(_) => "manifest_error",
            Error::Transport { .. } => "transport_error",
            Error::MergeGap { .. } => "merge_gap",
            Error::Remux(_) => "remux_error",
            Error::InvalidState { .. } => "invalid_state",
            Error::Io(_) => "io_error",
        }
    }
}

/// Failure of a single HTTP request, reported after the retry budget is spent
#[derive(Debug, Error)]
pub enum TransportError {
    /// Server answered with a non-success status
    #[error("GET {url} returned HTTP {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Request could not be completed (connect, timeout, body read)
    #[error("GET {url} failed: {source}")]
    Request {
        /// Requested URL
        url: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// Local I/O failure while handling a response
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// HTTP status code, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Request { source, .. } => source.status().map(|s| s.as_u16()),
            TransportError::Io(_) => None,
        }
    }
}

/// Playlist retrieval or parsing failure
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Playlist could not be downloaded
    #[error("failed to download playlist: {0}")]
    Fetch(#[source] TransportError),

    /// Playlist body is not a valid M3U8 document
    #[error("failed to parse playlist: {0}")]
    Parse(String),

    /// Playlist is a master playlist; a media playlist URL is required
    #[error("master playlists are not supported, pass a media playlist URL")]
    MasterPlaylist,

    /// Playlist or segment URL is malformed
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// Offending URL or URI
        url: String,
        /// Parser message
        reason: String,
    },

    /// No segments left after applying the index range
    #[error("playlist has no segments in the selected range")]
    Empty,
}

/// External remux tool failure
#[derive(Debug, Error)]
pub enum RemuxError {
    /// The tool could not be started
    #[error("failed to execute {tool}: {source}")]
    Spawn {
        /// Tool path
        tool: PathBuf,
        /// Spawn error
        #[source]
        source: std::io::Error,
    },

    /// The tool exited with a non-zero status
    #[error("remux exited with {}: {stderr}", describe_exit(.code))]
    Failed {
        /// Exit code (None if killed by a signal)
        code: Option<i32>,
        /// Diagnostic output of the tool
        stderr: String,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "signal".to_string(),
    }
}
