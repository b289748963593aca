//! Output directory layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// Environment variable overriding the default output directory.
pub const OUTPUT_DIR_ENV: &str = "VEO_OUTPUT_DIR";

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "mkv"];

/// Output directory layout for generated media.
///
/// Base directory resolution order: explicit path, then `$VEO_OUTPUT_DIR`,
/// then `./output`. Subdirectories are created eagerly so downstream code
/// can write without checking.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    base: PathBuf,
}

/// A recently generated video, listed without probing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentVideo {
    /// Absolute path
    pub path: PathBuf,
    /// Filename
    pub name: String,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: DateTime<Utc>,
}

impl StorageLayout {
    /// Create a layout rooted at an explicit directory.
    pub fn new(base: impl AsRef<Path>) -> StoreResult<Self> {
        let layout = Self {
            base: base.as_ref().to_path_buf(),
        };
        layout.ensure_dirs()?;
        Ok(layout)
    }

    /// Create a layout from the environment, falling back to `./output`.
    pub fn from_env() -> StoreResult<Self> {
        let base = std::env::var(OUTPUT_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("output"));
        Self::new(base)
    }

    fn ensure_dirs(&self) -> StoreResult<()> {
        for dir in [
            self.base.clone(),
            self.videos_dir(),
            self.frames_dir(),
            self.temp_dir(),
            self.jobs_dir(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                StoreError::layout_error(format!("{}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }

    /// Base output directory.
    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    /// Directory for generated videos.
    pub fn videos_dir(&self) -> PathBuf {
        self.base.join("videos")
    }

    /// Directory for extracted frames.
    pub fn frames_dir(&self) -> PathBuf {
        self.base.join("frames")
    }

    /// Directory for intermediate files.
    pub fn temp_dir(&self) -> PathBuf {
        self.base.join("temp")
    }

    /// Directory for persisted job records.
    pub fn jobs_dir(&self) -> PathBuf {
        self.base.join("jobs")
    }

    /// Path for a generated video file.
    pub fn video_path(&self, filename: &str) -> PathBuf {
        self.videos_dir().join(filename)
    }

    /// Path for an extracted frame file.
    pub fn frame_path(&self, filename: &str) -> PathBuf {
        self.frames_dir().join(filename)
    }

    /// Path for an intermediate file.
    pub fn temp_path(&self, filename: &str) -> PathBuf {
        self.temp_dir().join(filename)
    }

    /// `file://` URL for an existing file, None when the file is absent.
    pub fn file_url(&self, path: impl AsRef<Path>) -> Option<String> {
        let path = path.as_ref();
        if !path.exists() {
            return None;
        }
        let absolute = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());
        Some(format!("file://{}", absolute.display()))
    }

    /// Delete everything under the temp directory.
    pub async fn cleanup_temp(&self) -> StoreResult<usize> {
        let temp = self.temp_dir();
        let mut removed = 0;

        let mut entries = tokio::fs::read_dir(&temp).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let result = if path.is_dir() {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_file(&path).await
            };
            match result {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }

        debug!("Cleaned {} entries from {}", removed, temp.display());
        Ok(removed)
    }

    /// List the most recently modified videos, newest first.
    pub async fn recent_videos(&self, limit: usize) -> StoreResult<Vec<RecentVideo>> {
        let mut videos = Vec::new();

        let mut entries = tokio::fs::read_dir(self.videos_dir()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_video = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if !is_video {
                continue;
            }

            let metadata = entry.metadata().await?;
            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            videos.push(RecentVideo {
                name: entry.file_name().to_string_lossy().to_string(),
                path,
                size: metadata.len(),
                modified,
            });
        }

        videos.sort_by(|a, b| b.modified.cmp(&a.modified));
        videos.truncate(limit);
        Ok(videos)
    }
}
