//! Blocking generation operations.
//!
//! `Generator` wraps the provider's submit/poll/download cycle into a
//! single awaited call with progress callbacks. The non-blocking job model
//! lives in the controller; the workflow builder and plan executor use
//! this blocking path through the `ClipSource` seam.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use veo_client::{GenerateOptions, GenerateRequest, OperationStatus, VideoProvider};
use veo_media::{extract_frame_to_dir, probe_video, stitch_videos};
use veo_models::{ModelCatalog, VideoMetadata, VideoResult};
use veo_store::StorageLayout;

use crate::error::{EngineError, EngineResult};

/// Progress callback `(message, percent)`.
pub type ProgressFn = dyn Fn(&str, u8) + Send + Sync;

/// Seam used by the workflow builder and plan executor so generation and
/// frame extraction can be faked in tests.
#[async_trait]
pub trait ClipSource: Send + Sync {
    /// Generate a clip from a text prompt.
    async fn text_to_video(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerateOptions,
        on_progress: Option<&ProgressFn>,
    ) -> EngineResult<VideoResult>;

    /// Generate a clip seeded from a still image.
    async fn image_to_video(
        &self,
        image: &Path,
        prompt: &str,
        model: &str,
        options: &GenerateOptions,
        on_progress: Option<&ProgressFn>,
    ) -> EngineResult<VideoResult>;

    /// Extract a frame for use as the next clip's seed.
    async fn extract_seed_frame(&self, video: &Path, offset: f64) -> EngineResult<PathBuf>;

    /// Concatenate clips into a single artifact.
    async fn stitch(
        &self,
        paths: &[PathBuf],
        overlap: f64,
        on_progress: Option<&ProgressFn>,
    ) -> EngineResult<VideoResult>;
}

/// Provider-backed generation operations.
pub struct Generator {
    provider: Arc<dyn VideoProvider>,
    layout: StorageLayout,
    poll_interval: Duration,
}

impl Generator {
    pub fn new(provider: Arc<dyn VideoProvider>, layout: StorageLayout) -> Self {
        Self {
            provider,
            layout,
            poll_interval: Duration::from_secs(5),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Generate from a text prompt and wait for the artifact.
    pub async fn from_text(
        &self,
        prompt: &str,
        model: Option<&str>,
        options: GenerateOptions,
        on_progress: Option<&ProgressFn>,
    ) -> EngineResult<VideoResult> {
        let model = ModelCatalog::normalize(model);
        let request = GenerateRequest::new(prompt, model).with_options(options);
        self.run(request, on_progress).await
    }

    /// Generate from a seed image and wait for the artifact.
    pub async fn from_image(
        &self,
        image: &Path,
        prompt: &str,
        model: Option<&str>,
        options: GenerateOptions,
        on_progress: Option<&ProgressFn>,
    ) -> EngineResult<VideoResult> {
        if !image.exists() {
            return Err(EngineError::validation(format!(
                "Seed image not found: {}",
                image.display()
            )));
        }
        let model = ModelCatalog::normalize(model);
        let request = GenerateRequest::new(prompt, model)
            .with_image(image)
            .with_options(options);
        self.run(request, on_progress).await
    }

    /// Continue from a video by seeding with one of its frames.
    ///
    /// `extract_at` follows frame-offset semantics: negative values are
    /// measured from the end (default -1.0, one second before the end).
    pub async fn from_video(
        &self,
        video: &Path,
        prompt: &str,
        model: Option<&str>,
        extract_at: f64,
        options: GenerateOptions,
        on_progress: Option<&ProgressFn>,
    ) -> EngineResult<VideoResult> {
        if !video.exists() {
            return Err(EngineError::validation(format!(
                "Input video not found: {}",
                video.display()
            )));
        }

        if let Some(callback) = on_progress {
            callback("Extracting seed frame", 5);
        }
        let frame = extract_frame_to_dir(video, extract_at, self.layout.frames_dir()).await?;

        self.from_image(&frame, prompt, model, options, on_progress)
            .await
    }

    async fn run(
        &self,
        request: GenerateRequest,
        on_progress: Option<&ProgressFn>,
    ) -> EngineResult<VideoResult> {
        let mut result = VideoResult::new();
        result.prompt = request.prompt.clone();
        result.model = request.model.clone();

        let notify = |result: &VideoResult| {
            if let Some(callback) = on_progress {
                callback(&result.message, result.progress);
            }
        };

        result.update_progress("Submitting", 0);
        notify(&result);

        let operation = self.provider.submit(&request).await?;
        result.operation_id = Some(operation.id.clone());
        info!(
            provider = self.provider.name(),
            operation = %operation.id,
            model = %request.model,
            "Generation submitted"
        );

        let estimate = ModelCatalog::spec(&request.model).estimated_generation_secs;
        let started = Instant::now();

        result.update_progress("Generating", 10);
        notify(&result);

        loop {
            tokio::time::sleep(self.poll_interval).await;

            match self.provider.poll(&operation).await? {
                OperationStatus::Pending { progress_hint } => {
                    // Scale elapsed time into 10..=90 against the model's
                    // estimate; a provider hint can only move us forward
                    let elapsed = started.elapsed().as_secs_f64();
                    let scaled = 10 + ((elapsed / estimate as f64) * 80.0).min(80.0) as u8;
                    let percent = progress_hint
                        .unwrap_or(0)
                        .max(scaled)
                        .max(result.progress)
                        .min(90);
                    result.update_progress("Generating", percent);
                    notify(&result);
                }
                OperationStatus::Failed { message } => {
                    result.mark_failed(&message);
                    notify(&result);
                    return Err(EngineError::Client(
                        veo_client::ClientError::operation_failed(message),
                    ));
                }
                OperationStatus::Succeeded { video } => {
                    result.update_progress("Downloading", 95);
                    notify(&result);

                    let filename = format!("video_{}.mp4", result.short_id());
                    let dest = self.layout.video_path(&filename);
                    self.provider.download(&video, &dest).await?;

                    let info = probe_video(&dest).await?;
                    result.metadata = Some(VideoMetadata {
                        width: info.width,
                        height: info.height,
                        fps: info.fps,
                        duration: info.duration,
                        frame_count: info.frame_count,
                    });
                    result.url = self.layout.file_url(&dest);
                    result.path = Some(dest);
                    result.update_progress("Complete", 100);
                    notify(&result);

                    debug!(path = ?result.path, "Generation complete");
                    return Ok(result);
                }
            }
        }
    }
}

#[async_trait]
impl ClipSource for Generator {
    async fn text_to_video(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerateOptions,
        on_progress: Option<&ProgressFn>,
    ) -> EngineResult<VideoResult> {
        self.from_text(prompt, Some(model), options.clone(), on_progress)
            .await
    }

    async fn image_to_video(
        &self,
        image: &Path,
        prompt: &str,
        model: &str,
        options: &GenerateOptions,
        on_progress: Option<&ProgressFn>,
    ) -> EngineResult<VideoResult> {
        self.from_image(image, prompt, Some(model), options.clone(), on_progress)
            .await
    }

    async fn extract_seed_frame(&self, video: &Path, offset: f64) -> EngineResult<PathBuf> {
        Ok(extract_frame_to_dir(video, offset, self.layout.frames_dir()).await?)
    }

    async fn stitch(
        &self,
        paths: &[PathBuf],
        overlap: f64,
        on_progress: Option<&ProgressFn>,
    ) -> EngineResult<VideoResult> {
        let mut result = VideoResult::new();
        result.update_progress("Stitching", 0);
        if let Some(callback) = on_progress {
            callback("Stitching", 0);
        }

        let filename = format!("video_{}.mp4", result.short_id());
        let dest = self.layout.video_path(&filename);
        let info = stitch_videos(paths, overlap, &dest).await?;

        result.metadata = Some(VideoMetadata {
            width: info.width,
            height: info.height,
            fps: info.fps,
            duration: info.duration,
            frame_count: info.frame_count,
        });
        result.url = self.layout.file_url(&dest);
        result.path = Some(dest);
        result.update_progress("Complete", 100);
        if let Some(callback) = on_progress {
            callback("Complete", 100);
        }
        Ok(result)
    }
}
