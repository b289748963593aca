//! Seamless multi-clip stitching.
//!
//! Concatenates ordered clips into a single H.264/AAC MP4, trimming a
//! configurable overlap from the tail of every non-final segment to hide
//! seams between consecutive generations.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::{probe_video, VideoInfo};

/// Per-input facts the filtergraph builder needs.
#[derive(Debug, Clone, Copy)]
struct SegmentInfo {
    duration: f64,
    has_audio: bool,
}

/// Build the concat filtergraph for the given segments.
///
/// Returns the filtergraph and whether an audio output stream is mapped.
/// Audio is included when any segment carries audio; silent segments are
/// backfilled with `anullsrc` so the concat inputs stay uniform.
fn build_stitch_filter(segments: &[SegmentInfo], overlap: f64) -> (String, bool) {
    let include_audio = segments.iter().any(|s| s.has_audio);

    let mut filter_parts: Vec<String> = Vec::new();
    let mut video_refs: Vec<String> = Vec::new();
    let mut audio_refs: Vec<String> = Vec::new();

    for (idx, segment) in segments.iter().enumerate() {
        let is_last = idx == segments.len() - 1;
        let mut trim_end = segment.duration;
        if overlap > 0.0 && !is_last && segment.duration - overlap > 0.01 {
            trim_end = segment.duration - overlap;
        }

        let video_label = format!("v{}", idx);
        if trim_end < segment.duration {
            filter_parts.push(format!(
                "[{}:v]trim=0:{:.6},setpts=PTS-STARTPTS[{}]",
                idx, trim_end, video_label
            ));
        } else {
            filter_parts.push(format!("[{}:v]setpts=PTS-STARTPTS[{}]", idx, video_label));
        }
        video_refs.push(format!("[{}]", video_label));

        if include_audio {
            let audio_label = format!("a{}", idx);
            if segment.has_audio {
                if trim_end < segment.duration {
                    filter_parts.push(format!(
                        "[{}:a]atrim=0:{:.6},asetpts=PTS-STARTPTS[{}]",
                        idx, trim_end, audio_label
                    ));
                } else {
                    filter_parts.push(format!(
                        "[{}:a]asetpts=PTS-STARTPTS[{}]",
                        idx, audio_label
                    ));
                }
            } else {
                filter_parts.push(format!(
                    "anullsrc=channel_layout=stereo:sample_rate=48000,atrim=0:{:.6}[{}]",
                    trim_end, audio_label
                ));
            }
            audio_refs.push(format!("[{}]", audio_label));
        }
    }

    if include_audio {
        let concat_inputs: String = video_refs
            .iter()
            .zip(audio_refs.iter())
            .map(|(v, a)| format!("{}{}", v, a))
            .collect();
        filter_parts.push(format!(
            "{}concat=n={}:v=1:a=1[outv][outa]",
            concat_inputs,
            segments.len()
        ));
    } else {
        let concat_inputs: String = video_refs.concat();
        filter_parts.push(format!(
            "{}concat=n={}:v=1:a=0[outv]",
            concat_inputs,
            segments.len()
        ));
    }

    (filter_parts.join("; "), include_audio)
}

/// Stitch ordered clips into a single file at `output_path`.
///
/// Requires at least two clips, each existing on disk with a probeable
/// duration. Returns the probed info of the stitched output.
pub async fn stitch_videos(
    video_paths: &[PathBuf],
    overlap: f64,
    output_path: impl AsRef<Path>,
) -> MediaResult<VideoInfo> {
    let output_path = output_path.as_ref();

    if video_paths.len() < 2 {
        return Err(MediaError::stitch_failed(
            "Need at least two videos to stitch",
        ));
    }

    let mut segments = Vec::with_capacity(video_paths.len());
    for path in video_paths {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.clone()));
        }
        let probe = probe_video(path).await?;
        if probe.duration <= 0.0 {
            return Err(MediaError::stitch_failed(format!(
                "Unable to determine duration for {}",
                path.display()
            )));
        }
        segments.push(SegmentInfo {
            duration: probe.duration,
            has_audio: probe.has_audio,
        });
    }

    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let (filter_complex, include_audio) = build_stitch_filter(&segments, overlap);

    info!(
        "Stitching {} clips (overlap {:.2}s, audio: {}) -> {}",
        video_paths.len(),
        overlap,
        include_audio,
        output_path.display()
    );

    let mut cmd = FfmpegCommand::with_inputs(video_paths, output_path)
        .filter_complex(filter_complex)
        .map("[outv]");
    if include_audio {
        cmd = cmd.map("[outa]");
    }
    cmd = cmd
        .video_codec("libx264")
        .preset("fast")
        .crf(21)
        .pixel_format("yuv420p");
    if include_audio {
        cmd = cmd.audio_codec("aac").audio_bitrate("192k");
    }
    cmd = cmd.faststart();

    FfmpegRunner::new()
        .run(&cmd)
        .await
        .map_err(|e| match e {
            MediaError::FfmpegFailed { message, stderr, exit_code } => {
                MediaError::stitch_failed(format!(
                    "{} (exit code {:?}): {}",
                    message,
                    exit_code,
                    stderr.unwrap_or_default()
                ))
            }
            other => other,
        })?;

    probe_video(output_path).await
}

/// Stitch clips with explicit transition clips inserted between them.
///
/// Transitions are preserved exactly, so the underlying stitch runs with
/// zero overlap. Requires exactly `videos.len() - 1` transitions.
pub async fn stitch_with_transitions(
    video_paths: &[PathBuf],
    transition_paths: &[PathBuf],
    output_path: impl AsRef<Path>,
) -> MediaResult<VideoInfo> {
    if video_paths.len() < 2 {
        return Err(MediaError::stitch_failed(
            "Need at least two videos to stitch",
        ));
    }
    if transition_paths.len() != video_paths.len() - 1 {
        return Err(MediaError::stitch_failed(format!(
            "Need {} transitions for {} videos, got {}",
            video_paths.len() - 1,
            video_paths.len(),
            transition_paths.len()
        )));
    }

    let mut combined = Vec::with_capacity(video_paths.len() + transition_paths.len());
    for (idx, video) in video_paths.iter().enumerate() {
        combined.push(video.clone());
        if let Some(transition) = transition_paths.get(idx) {
            combined.push(transition.clone());
        }
    }

    stitch_videos(&combined, 0.0, output_path).await
}
