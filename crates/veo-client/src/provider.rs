//! Provider abstraction for remote video generation backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ClientResult;

/// Tunable generation parameters shared by all providers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Requested clip length in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    /// Aspect ratio, e.g. "16:9" or "9:16"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    /// What the model should avoid rendering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    /// Person rendering policy ("allow_all", "allow_adult", "dont_allow")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_generation: Option<String>,
    /// Whether the provider should generate audio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_audio: Option<bool>,
    /// Output resolution, e.g. "720p" or "1080p"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

/// A single generation request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Text prompt
    pub prompt: String,
    /// Canonical model id
    pub model: String,
    /// Optional seed image for image-to-video generation
    pub image: Option<PathBuf>,
    /// Generation parameters
    pub options: GenerateOptions,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            image: None,
            options: GenerateOptions::default(),
        }
    }

    pub fn with_image(mut self, image: impl Into<PathBuf>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }
}

/// Handle to an in-flight remote operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteOperation {
    /// Provider-scoped operation or job id
    pub id: String,
    /// Model the operation was submitted against
    pub model: String,
}

/// Reference to a downloadable generated video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoHandle {
    /// Download URL (absolute or provider-relative)
    pub url: String,
    /// MIME type when the provider reports one
    pub mime_type: Option<String>,
}

/// Result of a single non-blocking operation probe.
#[derive(Debug, Clone)]
pub enum OperationStatus {
    /// Still running; the hint is a coarse percentage when available
    Pending { progress_hint: Option<u8> },
    /// Finished with a downloadable video
    Succeeded { video: VideoHandle },
    /// Finished unsuccessfully
    Failed { message: String },
}

/// Result of a cancellation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The provider confirmed the cancellation
    Cancelled,
    /// The provider has no cancellation surface; the request stays advisory
    Unsupported,
}

/// A remote video generation backend.
///
/// Implementations are selected at startup from configuration and injected
/// into the engine; nothing holds a process-wide singleton.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Short provider name for logs and records.
    fn name(&self) -> &'static str;

    /// Submit a generation request, returning the remote operation handle.
    async fn submit(&self, request: &GenerateRequest) -> ClientResult<RemoteOperation>;

    /// Probe the operation once without blocking on completion.
    async fn poll(&self, operation: &RemoteOperation) -> ClientResult<OperationStatus>;

    /// Attempt to cancel. Best effort; the default has no remote surface.
    async fn cancel(&self, _operation: &RemoteOperation) -> ClientResult<CancelOutcome> {
        Ok(CancelOutcome::Unsupported)
    }

    /// Download a finished video to `dest`.
    async fn download(&self, video: &VideoHandle, dest: &Path) -> ClientResult<()>;
}
