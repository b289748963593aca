//! Provider client error types.

use thiserror::Error;

/// Result type for provider operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur talking to remote providers.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Provider configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Operation not supported by this provider: {0}")]
    Unsupported(String),

    #[error("API returned {status}: {body}")]
    ApiStatus { status: u16, body: String },

    #[error("Unexpected API response: {0}")]
    InvalidResponse(String),

    #[error("Remote operation failed: {0}")]
    OperationFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn operation_failed(msg: impl Into<String>) -> Self {
        Self::OperationFailed(msg.into())
    }

    /// Convert a non-success response into `ApiStatus`, consuming the body.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Self::ApiStatus { status, body }
    }
}
