//! Configuration types for hls-dl

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::PathBuf, time::Duration};

/// Default user agent sent with every playlist and segment request.
///
/// Caller-supplied headers with the same name take precedence.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Configuration for a single [`HlsJob`](crate::HlsJob)
///
/// Fixed at construction time and immutable for the job's lifetime. Every field
/// has a serde default, so a partial JSON/TOML document is a valid config.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobConfig {
    /// Maximum number of segments fetched in parallel (default: 5, clamped to at least 1)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Concatenate the fetched segments into a single file (default: true)
    #[serde(default = "default_true")]
    pub merge_segments: bool,

    /// Remux the merged file through ffmpeg into the output path (default: false)
    ///
    /// Requires `merge_segments`. When enabled, the merge target is an intermediate
    /// file inside `segments_dir` and the remuxed file is the deliverable.
    #[serde(default)]
    pub remux: bool,

    /// Directory holding segment artifacts and the merge intermediate (default: system temp dir)
    #[serde(default = "default_segments_dir")]
    pub segments_dir: PathBuf,

    /// Path to the ffmpeg executable (auto-detected from PATH if None)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Retry policy used by the HTTP transport for each request
    #[serde(default)]
    pub retry: RetryConfig,

    /// Remove segment artifacts and the intermediate file on error or cancel (default: true)
    #[serde(default = "default_true")]
    pub clean: bool,

    /// Extra request headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// User agent used unless `headers` overrides it
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// First segment index to download, inclusive (None = from the start)
    #[serde(default)]
    pub start_index: Option<usize>,

    /// Last segment index to download, inclusive (None = to the end)
    #[serde(default)]
    pub end_index: Option<usize>,

    /// Reuse segment artifacts that already exist on disk instead of fetching them
    #[serde(default)]
    pub skip_existing_segments: bool,

    /// File suffix of segment artifacts (default: ".ts")
    #[serde(default = "default_segment_suffix")]
    pub segment_suffix: String,

    /// Optional proxy for all requests
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,

    /// Per-request timeout (None = no timeout)
    #[serde(default, with = "optional_duration_serde")]
    pub request_timeout: Option<Duration>,

    /// Retry policy for removing the intermediate file after a successful remux
    #[serde(default)]
    pub delete_retry: DeleteRetryConfig,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            merge_segments: true,
            remux: false,
            segments_dir: default_segments_dir(),
            ffmpeg_path: None,
            retry: RetryConfig::default(),
            clean: true,
            headers: HashMap::new(),
            user_agent: default_user_agent(),
            start_index: None,
            end_index: None,
            skip_existing_segments: false,
            segment_suffix: default_segment_suffix(),
            proxy: None,
            request_timeout: None,
            delete_retry: DeleteRetryConfig::default(),
        }
    }
}

impl JobConfig {
    /// Effective fetch concurrency (never zero)
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

/// Proxy settings for the HTTP transport
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy URL (`http://`, `https://` or `socks5://`)
    pub url: String,

    /// Optional basic-auth username
    #[serde(default)]
    pub username: Option<String>,

    /// Optional basic-auth password
    #[serde(default)]
    pub password: Option<String>,
}

/// Retry configuration for transient transport failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first try (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Fixed-delay retry for best-effort file removal
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteRetryConfig {
    /// Retries after the first attempt (default: 3)
    #[serde(default = "default_max_attempts")]
    pub attempts: u32,

    /// Delay between attempts (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub delay: Duration,
}

impl Default for DeleteRetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_max_attempts(),
            delay: default_initial_delay(),
        }
    }
}

fn default_concurrency() -> usize {
    5
}

fn default_segments_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_segment_suffix() -> String {
    ".ts".into()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
