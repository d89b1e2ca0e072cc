//! External remux step (ffmpeg stream copy)

use crate::error::RemuxError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Re-containerizes `input` into `output` without re-encoding
#[async_trait]
pub trait Remuxer: Send + Sync {
    /// Run the remux; any failure is fatal for the job
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), RemuxError>;

    /// Name of the implementation (for logging)
    fn name(&self) -> &'static str;
}

/// [`Remuxer`] that shells out to ffmpeg
///
/// Runs `ffmpeg -y -i <input> -c copy <output>`. A non-zero exit status is
/// always a failure, regardless of what the tool printed. The child process is
/// killed if the remux future is dropped (e.g. on cancellation).
///
/// # Examples
///
/// ```no_run
/// use hls_dl::remux::{FfmpegRemuxer, Remuxer};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let remuxer = FfmpegRemuxer::discover();
/// remuxer.remux(Path::new("/tmp/output.ts"), Path::new("video.mp4")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct FfmpegRemuxer {
    binary_path: PathBuf,
}

impl FfmpegRemuxer {
    /// Create a remuxer with an explicit binary path
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Find ffmpeg in PATH, falling back to the bare name `ffmpeg`
    pub fn discover() -> Self {
        let binary_path = which::which("ffmpeg").unwrap_or_else(|_| PathBuf::from("ffmpeg"));
        Self { binary_path }
    }

    /// Use `path` if given, otherwise [`discover`](Self::discover)
    pub fn from_option(path: Option<&Path>) -> Self {
        match path {
            Some(p) => Self::new(p),
            None => Self::discover(),
        }
    }

    /// Path of the ffmpeg binary this remuxer invokes
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), RemuxError> {
        debug!(
            tool = ?self.binary_path,
            ?input,
            ?output,
            "running ffmpeg remux"
        );

        let result = Command::new(&self.binary_path)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-c")
            .arg("copy")
            .arg(output)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| RemuxError::Spawn {
                tool: self.binary_path.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(RemuxError::Failed {
                code: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}
