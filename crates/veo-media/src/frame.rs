//! Frame extraction.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_video;

/// Resolve a frame offset to an absolute time within the clip.
///
/// Negative offsets are measured from the end of the clip; positive offsets
/// are clamped to the duration.
pub fn resolve_frame_time(duration: f64, offset: f64) -> f64 {
    if offset < 0.0 {
        (duration + offset).max(0.0)
    } else {
        offset.min(duration)
    }
}

/// Extract a single frame to an explicit output path.
pub async fn extract_frame(
    video_path: impl AsRef<Path>,
    time_offset: f64,
    output_path: impl AsRef<Path>,
) -> MediaResult<PathBuf> {
    let video_path = video_path.as_ref();
    let output_path = output_path.as_ref();

    if !video_path.exists() {
        return Err(MediaError::FileNotFound(video_path.to_path_buf()));
    }

    let info = probe_video(video_path).await?;
    let target_time = resolve_frame_time(info.duration, time_offset);

    debug!(
        "Extracting frame from {} at {:.1}s -> {}",
        video_path.display(),
        target_time,
        output_path.display()
    );

    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let cmd = FfmpegCommand::new(video_path, output_path)
        .seek(target_time)
        .single_frame()
        .output_arg("-q:v")
        .output_arg("2");

    FfmpegRunner::new().run(&cmd).await?;

    Ok(output_path.to_path_buf())
}

/// Extract a single frame into a directory with a derived filename
/// (`frame_{stem}_at_{t:.1}s.jpg`).
pub async fn extract_frame_to_dir(
    video_path: impl AsRef<Path>,
    time_offset: f64,
    output_dir: impl AsRef<Path>,
) -> MediaResult<PathBuf> {
    let video_path = video_path.as_ref();

    if !video_path.exists() {
        return Err(MediaError::FileNotFound(video_path.to_path_buf()));
    }

    let info = probe_video(video_path).await?;
    let target_time = resolve_frame_time(info.duration, time_offset);

    let stem = video_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());
    let filename = format!("frame_{}_at_{:.1}s.jpg", stem, target_time);
    let output_path = output_dir.as_ref().join(filename);

    extract_frame(video_path, time_offset, &output_path).await
}

/// Extract multiple frames into a directory, one per requested offset.
pub async fn extract_frames(
    video_path: impl AsRef<Path>,
    time_offsets: &[f64],
    output_dir: impl AsRef<Path>,
) -> MediaResult<Vec<PathBuf>> {
    let video_path = video_path.as_ref();
    let output_dir = output_dir.as_ref();

    if !video_path.exists() {
        return Err(MediaError::FileNotFound(video_path.to_path_buf()));
    }

    let info = probe_video(video_path).await?;
    let stem = video_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());

    let mut frames = Vec::with_capacity(time_offsets.len());
    for (index, offset) in time_offsets.iter().enumerate() {
        let target_time = resolve_frame_time(info.duration, *offset);
        let filename = format!("frame_{}_{:03}_at_{:.1}s.jpg", stem, index, target_time);
        let output_path = output_dir.join(filename);
        frames.push(extract_frame(video_path, *offset, &output_path).await?);
    }

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_frame_time() {
        // Negative offsets count from the end
        assert!((resolve_frame_time(8.0, -1.0) - 7.0).abs() < 1e-9);
        // Clamped to zero for offsets past the start
        assert!((resolve_frame_time(2.0, -5.0)).abs() < 1e-9);
        // Positive offsets clamped to the duration
        assert!((resolve_frame_time(8.0, 20.0) - 8.0).abs() < 1e-9);
        assert!((resolve_frame_time(8.0, 3.5) - 3.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_extract_missing_file() {
        let err = extract_frame("/nonexistent.mp4", -1.0, "/tmp/frame.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
