//! End-to-end stitch over real FFmpeg output. Skipped when FFmpeg or
//! FFprobe is not installed.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use veo_media::{check_ffmpeg, check_ffprobe, stitch_videos};

fn synth_clip(dir: &Path, name: &str, seconds: u32) -> PathBuf {
    let path = dir.join(name);
    let status = Command::new("ffmpeg")
        .args([
            "-y",
            "-v",
            "error",
            "-f",
            "lavfi",
            "-i",
            &format!("testsrc=duration={}:size=320x240:rate=24", seconds),
            "-f",
            "lavfi",
            "-i",
            &format!("sine=frequency=440:duration={}", seconds),
            "-c:v",
            "libx264",
            "-preset",
            "ultrafast",
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            path.to_str().unwrap(),
        ])
        .status()
        .expect("ffmpeg invocation");
    assert!(status.success());
    path
}

#[tokio::test]
async fn overlap_stitch_of_two_clips_lands_near_fifteen_seconds() {
    if check_ffmpeg().is_err() || check_ffprobe().is_err() {
        eprintln!("skipping: ffmpeg/ffprobe not installed");
        return;
    }

    let dir = TempDir::new().unwrap();
    let a = synth_clip(dir.path(), "a.mp4", 8);
    let b = synth_clip(dir.path(), "b.mp4", 8);

    let out = dir.path().join("stitched.mp4");
    let info = stitch_videos(&[a, b], 1.0, &out).await.unwrap();

    assert!(out.is_file());
    // 8 + 8 with one second trimmed from the first clip
    assert!(
        (info.duration - 15.0).abs() < 0.5,
        "stitched duration was {}",
        info.duration
    );
    assert!(info.has_audio);
    assert_eq!(info.width, 320);
    assert_eq!(info.height, 240);
    assert!(info.size > 0);
    assert!(info.bitrate > 0, "probe should report a container bitrate");
}

#[tokio::test]
async fn zero_overlap_stitch_preserves_total_duration() {
    if check_ffmpeg().is_err() || check_ffprobe().is_err() {
        eprintln!("skipping: ffmpeg/ffprobe not installed");
        return;
    }

    let dir = TempDir::new().unwrap();
    let a = synth_clip(dir.path(), "a.mp4", 3);
    let b = synth_clip(dir.path(), "b.mp4", 4);

    let out = dir.path().join("joined.mp4");
    let info = stitch_videos(&[a, b], 0.0, &out).await.unwrap();

    assert!(
        (info.duration - 7.0).abs() < 0.5,
        "joined duration was {}",
        info.duration
    );
}
