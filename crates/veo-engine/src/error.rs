//! Engine error types.

use thiserror::Error;

use veo_client::ClientError;
use veo_media::MediaError;
use veo_models::{ErrorCode, VideoResult};
use veo_store::StoreError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur during orchestration.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Plan execution failed at clip {clip_index}: {message}")]
    PlanFailed {
        clip_index: usize,
        message: String,
        /// Results for the clips that completed before the failure, in order
        completed: Vec<VideoResult>,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Wire-level classification for the tool boundary.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            EngineError::Validation(_) | EngineError::JobNotFound(_) => ErrorCode::Validation,
            EngineError::Client(ClientError::InvalidRequest(_)) => ErrorCode::Validation,
            EngineError::Media(MediaError::StitchFailed(_)) => ErrorCode::Stitch,
            _ => ErrorCode::Unknown,
        }
    }

    /// Flat `{error_code, error_message}` record returned by every tool on
    /// failure.
    pub fn error_record(&self) -> serde_json::Value {
        serde_json::json!({
            "error_code": self.error_code().as_str(),
            "error_message": self.to_string(),
        })
    }
}
