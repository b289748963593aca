//! FFmpeg CLI wrapper for local media post-processing.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with progress parsing
//! - FFprobe media inspection
//! - Frame extraction (offsets measured from either end)
//! - Seamless multi-clip stitching with overlap trimming

pub mod command;
pub mod error;
pub mod frame;
pub mod probe;
pub mod progress;
pub mod stitch;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use frame::{extract_frame, extract_frame_to_dir, extract_frames};
pub use probe::{probe_video, VideoInfo};
pub use progress::FfmpegProgress;
pub use stitch::{stitch_videos, stitch_with_transitions};
