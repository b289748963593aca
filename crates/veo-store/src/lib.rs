//! Local filesystem storage.
//!
//! This crate provides:
//! - Output directory layout (videos, frames, temp)
//! - File-backed job record persistence
//! - Recent-video listing for diagnostics

pub mod error;
pub mod job_store;
pub mod layout;

pub use error::{StoreError, StoreResult};
pub use job_store::JobStore;
pub use layout::{RecentVideo, StorageLayout};
