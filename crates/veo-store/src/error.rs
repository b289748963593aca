//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to prepare storage directory: {0}")]
    LayoutError(String),

    #[error("Invalid job id for filename: {0}")]
    InvalidJobId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn layout_error(msg: impl Into<String>) -> Self {
        Self::LayoutError(msg.into())
    }
}
