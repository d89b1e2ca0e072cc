//! Segment store: the on-disk area holding one artifact per segment index
//! plus the merge intermediate. Pure I/O, no policy.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// File name of the merge intermediate used when remuxing
pub const MERGED_FILE_NAME: &str = "output.ts";

/// Minimum zero-padding width of artifact indices
const INDEX_WIDTH: usize = 5;

/// Filesystem layout of a job's segment directory
///
/// Artifacts are named `segment{index:05}{suffix}`. Two jobs must not share a
/// directory: index-keyed names collide.
#[derive(Clone, Debug)]
pub struct SegmentStore {
    dir: PathBuf,
    suffix: String,
}

impl SegmentStore {
    /// Create a store rooted at `dir` whose artifacts end in `suffix`
    pub fn new(dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
        }
    }

    /// Root directory of the store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the store directory if it does not exist
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Path of the artifact for `index`
    pub fn segment_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!(
            "segment{index:0width$}{suffix}",
            width = INDEX_WIDTH,
            suffix = self.suffix
        ))
    }

    /// Path of the merge intermediate
    pub fn merged_path(&self) -> PathBuf {
        self.dir.join(MERGED_FILE_NAME)
    }

    /// Whether the artifact for `index` exists
    pub async fn contains(&self, index: usize) -> bool {
        fs::try_exists(self.segment_path(index))
            .await
            .unwrap_or(false)
    }

    /// Write the artifact for `index`, replacing any previous content
    pub async fn write_segment(&self, index: usize, data: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.segment_path(index);
        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;
        Ok(path)
    }
}

/// Remove a file, treating "not found" as success
pub(crate) async fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
