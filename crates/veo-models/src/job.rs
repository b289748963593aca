//! Job record definitions for asynchronous generation tracking.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle state of a tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is submitted but the remote operation has not started
    #[default]
    Queued,
    /// Remote operation is running
    Processing,
    /// Job completed successfully
    Complete,
    /// Job failed
    Failed,
    /// Job was cancelled before completion
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states accept no further mutation.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Complete | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error classification surfaced at the tool boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ErrorCode {
    /// Bad caller input (unknown job id, malformed plan file, ...)
    #[serde(rename = "VALIDATION")]
    Validation,
    /// Post-processing failure during concatenation
    #[serde(rename = "STITCH")]
    Stitch,
    /// Unclassified remote or internal failure
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Validation => "VALIDATION",
            ErrorCode::Stitch => "STITCH",
            ErrorCode::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted record for a tracked unit of asynchronous remote work.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobRecord {
    /// Unique job ID
    pub job_id: JobId,

    /// Current lifecycle state
    #[serde(default)]
    pub status: JobStatus,

    /// Progress (0-100)
    #[serde(default)]
    pub progress: u8,

    /// Human-readable progress message
    #[serde(default)]
    pub message: String,

    /// Job type tag (e.g. "generate")
    pub kind: String,

    /// Prompt submitted with the job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Model the remote call was submitted against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Result payload once complete
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    /// Error classification (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,

    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Identifier of the remote long-running operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_operation_id: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Advisory cancellation flag, observed at poll time
    #[serde(default)]
    pub cancel_requested: bool,
}

impl JobRecord {
    /// Create a new queued record.
    pub fn new(kind: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            job_id: JobId::new(),
            status: JobStatus::Queued,
            progress: 0,
            message: "Queued".to_string(),
            kind: kind.into(),
            prompt: None,
            model: None,
            result: None,
            error_code: None,
            error_message: None,
            remote_operation_id: None,
            created_at: now,
            updated_at: now,
            cancel_requested: false,
        }
    }

    /// Attach the request details the job was created for.
    pub fn with_request(mut self, prompt: impl Into<String>, model: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self.model = Some(model.into());
        self
    }

    /// Whether the record is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Transition to processing. No-op on terminal records.
    pub fn processing(mut self, remote_operation_id: impl Into<String>) -> Self {
        if self.is_terminal() {
            return self;
        }
        self.status = JobStatus::Processing;
        self.remote_operation_id = Some(remote_operation_id.into());
        self.updated_at = Utc::now();
        self
    }

    /// Update progress and message. No-op on terminal records.
    pub fn with_progress(mut self, message: impl Into<String>, progress: u8) -> Self {
        if self.is_terminal() {
            return self;
        }
        self.progress = progress.min(100);
        self.message = message.into();
        self.updated_at = Utc::now();
        self
    }

    /// Mark complete with a result payload. No-op on terminal records.
    pub fn complete(mut self, result: serde_json::Value) -> Self {
        if self.is_terminal() {
            return self;
        }
        self.status = JobStatus::Complete;
        self.progress = 100;
        self.message = "Complete".to_string();
        self.result = Some(result);
        self.updated_at = Utc::now();
        self
    }

    /// Mark failed with an error classification. No-op on terminal records.
    pub fn fail(mut self, code: ErrorCode, error: impl Into<String>) -> Self {
        if self.is_terminal() {
            return self;
        }
        self.status = JobStatus::Failed;
        self.error_code = Some(code);
        self.error_message = Some(error.into());
        self.message = "Failed".to_string();
        self.updated_at = Utc::now();
        self
    }

    /// Mark cancelled. No-op on terminal records.
    pub fn cancelled(mut self) -> Self {
        if self.is_terminal() {
            return self;
        }
        self.status = JobStatus::Cancelled;
        self.message = "Cancelled".to_string();
        self.updated_at = Utc::now();
        self
    }

    /// Request cancellation. Advisory only; terminal records are unchanged.
    pub fn request_cancel(mut self) -> Self {
        if self.is_terminal() {
            return self;
        }
        self.cancel_requested = true;
        self.updated_at = Utc::now();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_lifecycle() {
        let record = JobRecord::new("generate");
        assert_eq!(record.status, JobStatus::Queued);

        let record = record.processing("operations/abc");
        assert_eq!(record.status, JobStatus::Processing);
        assert_eq!(record.remote_operation_id.as_deref(), Some("operations/abc"));

        let record = record.with_progress("Generating 30s", 42);
        assert_eq!(record.progress, 42);

        let record = record.complete(serde_json::json!({"path": "out.mp4"}));
        assert_eq!(record.status, JobStatus::Complete);
        assert_eq!(record.progress, 100);
    }

    #[test]
    fn test_terminal_records_are_final() {
        let failed = JobRecord::new("generate").fail(ErrorCode::Unknown, "remote exploded");
        assert!(failed.is_terminal());

        let still_failed = failed.clone().complete(serde_json::json!({}));
        assert_eq!(still_failed.status, JobStatus::Failed);

        let still_failed = still_failed.with_progress("late update", 50);
        assert_eq!(still_failed.progress, failed.progress);

        let still_failed = still_failed.cancelled();
        assert_eq!(still_failed.status, JobStatus::Failed);
    }

    #[test]
    fn test_cancel_request_is_advisory() {
        let record = JobRecord::new("generate").request_cancel();
        assert!(record.cancel_requested);
        assert_eq!(record.status, JobStatus::Queued);

        let done = JobRecord::new("generate").complete(serde_json::json!({}));
        let done = done.request_cancel();
        assert!(!done.cancel_requested);
    }

    #[test]
    fn test_error_code_wire_format() {
        let json = serde_json::to_string(&ErrorCode::Validation).unwrap();
        assert_eq!(json, "\"VALIDATION\"");
        let json = serde_json::to_string(&ErrorCode::Stitch).unwrap();
        assert_eq!(json, "\"STITCH\"");
    }

    #[test]
    fn test_progress_is_clamped() {
        let record = JobRecord::new("generate").with_progress("over", 150);
        assert_eq!(record.progress, 100);
    }
}
