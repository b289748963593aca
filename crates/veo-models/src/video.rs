//! Video generation result models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::job::JobStatus;

/// Media metadata probed from a rendered artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct VideoMetadata {
    /// Width in pixels
    #[serde(default)]
    pub width: u32,
    /// Height in pixels
    #[serde(default)]
    pub height: u32,
    /// Frame rate (fps)
    #[serde(default)]
    pub fps: f64,
    /// Duration in seconds
    #[serde(default)]
    pub duration: f64,
    /// Total frame count
    #[serde(default)]
    pub frame_count: u64,
}

/// Result of a single generation or stitch operation.
///
/// Progress fields mutate while the call is in flight; once returned to the
/// caller the result is treated as immutable.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoResult {
    /// Unique result ID (also used to derive artifact filenames)
    pub id: String,

    /// Prompt that produced the artifact
    #[serde(default)]
    pub prompt: String,

    /// Model identifier used
    #[serde(default)]
    pub model: String,

    /// Local artifact location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Derived file:// URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Status mirroring the job lifecycle
    #[serde(default)]
    pub status: JobStatus,

    /// Progress (0-100)
    #[serde(default)]
    pub progress: u8,

    /// Last progress message
    #[serde(default)]
    pub message: String,

    /// Remote operation identifier, when the result came from a remote call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    /// Probed media metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<VideoMetadata>,

    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VideoResult {
    /// Create a new pending result.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            prompt: String::new(),
            model: String::new(),
            path: None,
            url: None,
            status: JobStatus::Queued,
            progress: 0,
            message: String::new(),
            operation_id: None,
            metadata: None,
            error: None,
        }
    }

    /// Short id prefix used for artifact filenames (`video_{short_id}.mp4`).
    pub fn short_id(&self) -> &str {
        &self.id[..8.min(self.id.len())]
    }

    /// Record an in-flight progress update.
    pub fn update_progress(&mut self, message: impl Into<String>, percent: u8) {
        self.message = message.into();
        self.progress = percent.min(100);
        if self.progress >= 100 {
            self.status = JobStatus::Complete;
        } else if self.progress > 0 {
            self.status = JobStatus::Processing;
        }
    }

    /// Mark the result failed.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
    }

    /// Flat JSON record for the tool boundary.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "prompt": self.prompt,
            "model": self.model,
            "path": self.path.as_ref().map(|p| p.display().to_string()),
            "url": self.url,
            "status": self.status.as_str(),
            "metadata": self.metadata,
        })
    }
}

impl Default for VideoResult {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_ids_are_unique() {
        let a = VideoResult::new();
        let b = VideoResult::new();
        assert_ne!(a.id, b.id);
        assert_eq!(a.short_id().len(), 8);
    }

    #[test]
    fn test_progress_drives_status() {
        let mut result = VideoResult::new();
        assert_eq!(result.status, JobStatus::Queued);

        result.update_progress("Generating", 50);
        assert_eq!(result.status, JobStatus::Processing);

        result.update_progress("Complete", 100);
        assert_eq!(result.status, JobStatus::Complete);
    }

    #[test]
    fn test_to_value_is_flat() {
        let mut result = VideoResult::new();
        result.prompt = "a quiet harbor".to_string();
        result.path = Some(PathBuf::from("/out/videos/video_abc.mp4"));

        let value = result.to_value();
        assert_eq!(value["prompt"], "a quiet harbor");
        assert_eq!(value["path"], "/out/videos/video_abc.mp4");
        assert_eq!(value["status"], "queued");
    }
}
