//! Remote provider clients.
//!
//! This crate provides:
//! - The `VideoProvider` trait shared by all generation backends
//! - Google GenAI long-running-operation adapter
//! - Daydreams Router job adapter
//! - Gemini scene-planner client

pub mod daydreams;
pub mod error;
pub mod google;
pub mod planner;
pub mod provider;

pub use daydreams::DaydreamsProvider;
pub use error::{ClientError, ClientResult};
pub use google::GoogleProvider;
pub use planner::{PlanRequest, PlannerClient};
pub use provider::{
    CancelOutcome, GenerateOptions, GenerateRequest, OperationStatus, RemoteOperation,
    VideoHandle, VideoProvider,
};
