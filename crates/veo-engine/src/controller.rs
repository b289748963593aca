//! Non-blocking job controller.
//!
//! `submit` performs the remote submit inline (the call itself is fast; the
//! generation runs server-side), then every `poll` does exactly one status
//! probe with no internal sleeps. Remote failures land in the persisted
//! record instead of propagating, so polling callers never crash on a
//! transient remote fault. Cancellation is advisory and observed at poll
//! time.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use validator::Validate;

use veo_client::{
    CancelOutcome, GenerateOptions, GenerateRequest, OperationStatus, RemoteOperation,
    VideoProvider,
};
use veo_media::{extract_frame_to_dir, probe_video};
use veo_models::{JobId, JobRecord, JobStatus, ModelCatalog, VideoMetadata, VideoResult};
use veo_store::{JobStore, StorageLayout};

use crate::error::{EngineError, EngineResult};
use crate::logging::JobLogger;

/// Parameters for starting an asynchronous generation job.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct GenerateStartParams {
    /// Text prompt
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub prompt: String,
    /// Model id; the catalog default is used when omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Seed image path for image-to-video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_image_path: Option<PathBuf>,
    /// Input video path for video continuation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_video_path: Option<PathBuf>,
    /// Frame offset for video continuation (negative = from end)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_at: Option<f64>,
    /// Generation options
    #[serde(default)]
    pub options: GenerateOptions,
}

/// Controller over the persisted job store and the remote provider.
pub struct JobController {
    provider: Arc<dyn VideoProvider>,
    store: JobStore,
    layout: StorageLayout,
}

impl JobController {
    pub fn new(provider: Arc<dyn VideoProvider>, store: JobStore, layout: StorageLayout) -> Self {
        Self {
            provider,
            store,
            layout,
        }
    }

    /// Start a generation job.
    ///
    /// The returned record is `processing` when the remote submit succeeded
    /// and `failed` when it did not; submit errors are recorded, not raised.
    pub async fn submit(&self, params: GenerateStartParams) -> EngineResult<JobRecord> {
        params
            .validate()
            .map_err(|e| EngineError::validation(e.to_string()))?;

        let model = ModelCatalog::normalize(params.model.as_deref());
        let mut record = JobRecord::new("generate").with_request(&params.prompt, &model);
        let logger = JobLogger::new(&record.job_id, "generate");

        // Queued state is visible before any remote work happens
        self.store.save(&record).await?;
        logger.log_start(&format!("model={}", model));

        let seed_image = match self.resolve_seed_image(&params).await {
            Ok(seed) => seed,
            Err(e) => {
                record = record.fail(e.error_code(), e.to_string());
                self.store.save(&record).await?;
                logger.log_error(&format!("seed resolution failed: {}", e));
                return Ok(record);
            }
        };

        let mut request =
            GenerateRequest::new(&params.prompt, &model).with_options(params.options.clone());
        if let Some(image) = seed_image {
            request = request.with_image(image);
        }

        match self.provider.submit(&request).await {
            Ok(operation) => {
                record = record
                    .processing(&operation.id)
                    .with_progress("Submitted", 10);
                self.store.save(&record).await?;
                logger.log_progress(&format!("remote operation {}", operation.id));
            }
            Err(e) => {
                let engine_err = EngineError::from(e);
                record = record.fail(engine_err.error_code(), engine_err.to_string());
                self.store.save(&record).await?;
                logger.log_error(&format!("submit failed: {}", engine_err));
            }
        }

        Ok(record)
    }

    /// Read current job state, probing the remote operation once.
    pub async fn poll(&self, job_id: &JobId) -> EngineResult<JobRecord> {
        let record = self
            .store
            .load(job_id)
            .await?
            .ok_or_else(|| EngineError::JobNotFound(job_id.to_string()))?;

        // Terminal records are immutable; reread is idempotent
        if record.is_terminal() {
            return Ok(record);
        }

        let logger = JobLogger::new(job_id, "generate");

        if record.cancel_requested {
            if let Some(finalized) = self.try_finalize_cancel(&record, &logger).await? {
                return Ok(finalized);
            }
            // Provider cannot cancel; the flag stays advisory and the job
            // may still complete normally
        }

        let Some(operation_id) = record.remote_operation_id.clone() else {
            return Ok(record);
        };
        let operation = RemoteOperation {
            id: operation_id,
            model: record
                .model
                .clone()
                .unwrap_or_else(|| ModelCatalog::normalize(None)),
        };

        let status = match self.provider.poll(&operation).await {
            Ok(status) => status,
            Err(e) => {
                let engine_err = EngineError::from(e);
                let failed = record.fail(engine_err.error_code(), engine_err.to_string());
                self.store.save(&failed).await?;
                logger.log_error(&format!("poll failed: {}", engine_err));
                return Ok(failed);
            }
        };

        let updated = match status {
            OperationStatus::Pending { progress_hint } => {
                let percent = progress_hint.unwrap_or(record.progress).max(record.progress);
                record.with_progress("Generating", percent.min(90))
            }
            OperationStatus::Failed { message } => {
                logger.log_error(&message);
                record.fail(veo_models::ErrorCode::Unknown, message)
            }
            OperationStatus::Succeeded { video } => {
                match self.finalize_success(&record, &video).await {
                    Ok(result) => {
                        logger.log_completion("artifact downloaded");
                        record.complete(result.to_value())
                    }
                    Err(e) => {
                        logger.log_error(&format!("finalize failed: {}", e));
                        record.fail(e.error_code(), e.to_string())
                    }
                }
            }
        };

        self.store.save(&updated).await?;
        Ok(updated)
    }

    /// Request cancellation. Terminal jobs are returned unchanged.
    pub async fn cancel(&self, job_id: &JobId) -> EngineResult<JobRecord> {
        let record = self
            .store
            .load(job_id)
            .await?
            .ok_or_else(|| EngineError::JobNotFound(job_id.to_string()))?;

        if record.is_terminal() {
            return Ok(record);
        }

        let updated = record.request_cancel();
        self.store.save(&updated).await?;
        JobLogger::new(job_id, "generate").log_progress("cancellation requested");
        Ok(updated)
    }

    async fn resolve_seed_image(
        &self,
        params: &GenerateStartParams,
    ) -> EngineResult<Option<PathBuf>> {
        if let Some(image) = &params.input_image_path {
            if !image.exists() {
                return Err(EngineError::validation(format!(
                    "Input image not found: {}",
                    image.display()
                )));
            }
            return Ok(Some(image.clone()));
        }

        if let Some(video) = &params.input_video_path {
            if !video.exists() {
                return Err(EngineError::validation(format!(
                    "Input video not found: {}",
                    video.display()
                )));
            }
            let offset = params.extract_at.unwrap_or(-1.0);
            let frame = extract_frame_to_dir(video, offset, self.layout.frames_dir()).await?;
            return Ok(Some(frame));
        }

        Ok(None)
    }

    async fn try_finalize_cancel(
        &self,
        record: &JobRecord,
        logger: &JobLogger,
    ) -> EngineResult<Option<JobRecord>> {
        let Some(operation_id) = record.remote_operation_id.clone() else {
            // Nothing remote was started; cancel locally
            let cancelled = record.clone().cancelled();
            self.store.save(&cancelled).await?;
            logger.log_completion("cancelled before remote submit");
            return Ok(Some(cancelled));
        };

        let operation = RemoteOperation {
            id: operation_id,
            model: record
                .model
                .clone()
                .unwrap_or_else(|| ModelCatalog::normalize(None)),
        };

        match self.provider.cancel(&operation).await {
            Ok(CancelOutcome::Cancelled) => {
                let cancelled = record.clone().cancelled();
                self.store.save(&cancelled).await?;
                logger.log_completion("remote operation cancelled");
                Ok(Some(cancelled))
            }
            Ok(CancelOutcome::Unsupported) => Ok(None),
            Err(e) => {
                logger.log_warning(&format!("remote cancel failed: {}", e));
                Ok(None)
            }
        }
    }

    async fn finalize_success(
        &self,
        record: &JobRecord,
        video: &veo_client::VideoHandle,
    ) -> EngineResult<VideoResult> {
        let mut result = VideoResult::new();
        result.prompt = record.prompt.clone().unwrap_or_default();
        result.model = record.model.clone().unwrap_or_default();
        result.operation_id = record.remote_operation_id.clone();

        let filename = format!("video_{}.mp4", result.short_id());
        let dest = self.layout.video_path(&filename);
        self.provider.download(video, &dest).await?;

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
        result.status = JobStatus::Complete;
        result.progress = 100;
        Ok(result)
    }
}
