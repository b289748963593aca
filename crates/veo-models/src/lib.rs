//! Shared data models for the Veoforge SDK.
//!
//! This crate provides Serde-serializable types for:
//! - Job records and lifecycle status
//! - Video generation results and media metadata
//! - Workflow step logs
//! - Scene plans (structured multi-clip storyboards)
//! - The video model catalog with capability flags

pub mod catalog;
pub mod job;
pub mod plan;
pub mod video;
pub mod workflow;

// Re-export common types
pub use catalog::{ModelCatalog, ModelSpec};
pub use job::{ErrorCode, JobId, JobRecord, JobStatus};
pub use plan::{
    AudioTrack, CharacterProfile, Cinematography, Clip, Dialogue, Performance, Scene, ScenePlan,
    Shot, Subject, VisualDetails,
};
pub use video::{VideoMetadata, VideoResult};
pub use workflow::{StepAction, WorkflowRecord, WorkflowStep};
