//! Orchestration for the Veoforge SDK.
//!
//! This crate provides:
//! - Blocking generation (`Generator`) and the `ClipSource` seam
//! - Non-blocking job lifecycle (`JobController`) over the file-backed store
//! - The chained workflow builder (`Bridge`)
//! - Scene-plan execution with auto-seed carry-forward
//! - The flat tool surface (`Engine`) and its param records
//! - Telemetry setup and per-job structured logging

pub mod bridge;
pub mod config;
pub mod controller;
pub mod error;
pub mod generate;
pub mod logging;
pub mod plan;
pub mod telemetry;
pub mod tools;

pub use bridge::Bridge;
pub use config::{EngineConfig, ProviderKind};
pub use controller::{GenerateStartParams, JobController};
pub use error::{EngineError, EngineResult};
pub use generate::{ClipSource, Generator, ProgressFn};
pub use logging::JobLogger;
pub use plan::{
    execute_plan, ImageProvider, PlanExecution, PlanOptions, PlanSource, PromptBuilder,
};
pub use tools::{Engine, ExtractFrameParams, StitchVideosParams};
