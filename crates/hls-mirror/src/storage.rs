//! # Segment storage
//!
//! Filesystem seam for the download engine. Writes go through a `.part`
//! sibling and a rename so an interrupted transfer never leaves a file that
//! looks complete. A write dropped mid-flight (shutdown) skips its cleanup, so
//! `ensure_dir` sweeps stale `.part` files before the mirror starts.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::hls::HlsMirrorError;

const PART_EXTENSION: &str = "part";

#[async_trait]
pub trait SegmentStore: Send + Sync {
    /// Create `path` and any missing parents, and get it ready for writes
    async fn ensure_dir(&self, path: &Path) -> Result<(), HlsMirrorError>;

    async fn exists(&self, path: &Path) -> Result<bool, HlsMirrorError>;

    /// Write the whole body to `path`
    async fn write(&self, path: &Path, data: Bytes) -> Result<(), HlsMirrorError>;
}

#[derive(Debug, Clone, Default)]
pub struct FsSegmentStore;

impl FsSegmentStore {
    pub fn new() -> Self {
        Self
    }

    fn part_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".");
        name.push(PART_EXTENSION);
        path.with_file_name(name)
    }

    /// Remove `.part` files left in `dir` by transfers that never finished.
    async fn sweep_partials(dir: &Path) -> Result<usize, HlsMirrorError> {
        let mut entries = fs::read_dir(dir).await?;
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != PART_EXTENSION)
                || !entry.file_type().await?.is_file()
            {
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Cannot remove stale partial file"),
            }
        }

        if removed > 0 {
            debug!(dir = %dir.display(), removed, "Removed stale partial files");
        }
        Ok(removed)
    }
}

#[async_trait]
impl SegmentStore for FsSegmentStore {
    async fn ensure_dir(&self, path: &Path) -> Result<(), HlsMirrorError> {
        fs::create_dir_all(path).await?;
        Self::sweep_partials(path).await?;
        Ok(())
    }

    async fn exists(&self, path: &Path) -> Result<bool, HlsMirrorError> {
        Ok(fs::try_exists(path).await?)
    }

    async fn write(&self, path: &Path, data: Bytes) -> Result<(), HlsMirrorError> {
        let part = Self::part_path(path);

        let result = async {
            let mut file = fs::File::create(&part).await?;
            file.write_all(&data).await?;
            file.flush().await?;
            fs::rename(&part, path).await
        }
        .await;

        if let Err(e) = result {
            // Best effort, the .part file is never read back
            let _ = fs::remove_file(&part).await;
            return Err(e.into());
        }

        debug!(path = %path.display(), bytes = data.len(), "Segment written");
        Ok(())
    }
}
