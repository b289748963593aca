//! Flat tool surface.
//!
//! Every operation takes a serde param record and returns a flat JSON
//! value; errors never propagate past this boundary, they become
//! `{error_code, error_message}` records instead. Callers embedding the
//! SDK in an agent or RPC layer talk to `Engine` only.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use validator::Validate;

use veo_client::{DaydreamsProvider, PlanRequest, PlannerClient, VideoProvider};
use veo_media::{check_ffmpeg, check_ffprobe, extract_frame_to_dir};
use veo_models::{catalog::DEFAULT_MODEL, JobId, ModelCatalog};
use veo_store::{JobStore, StorageLayout};

use crate::bridge::Bridge;
use crate::config::{EngineConfig, ProviderKind};
use crate::controller::{GenerateStartParams, JobController};
use crate::error::{EngineError, EngineResult};
use crate::generate::{ClipSource, Generator};
use crate::plan::{execute_plan, PlanOptions, PlanSource};

/// Parameters for `extract_frame`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExtractFrameParams {
    /// Source video path
    #[validate(length(min = 1, message = "video_path must not be empty"))]
    pub video_path: String,
    /// Offset in seconds; negative values are measured from the end
    #[serde(default = "default_extract_offset")]
    pub time_offset: f64,
}

fn default_extract_offset() -> f64 {
    -1.0
}

/// Parameters for `stitch_videos`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StitchVideosParams {
    /// Clips in timeline order
    #[validate(length(min = 2, message = "stitching needs at least two videos"))]
    pub video_paths: Vec<String>,
    /// Seconds trimmed from the tail of each clip except the last
    #[serde(default = "default_overlap")]
    pub overlap: f64,
}

fn default_overlap() -> f64 {
    1.0
}

/// Entry point over the configured provider, store and layout.
pub struct Engine {
    config: EngineConfig,
    provider: Arc<dyn VideoProvider>,
    layout: StorageLayout,
    controller: JobController,
    generator: Arc<Generator>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let provider = config.build_provider()?;
        let layout = config.build_layout()?;
        let store = JobStore::new(&layout);
        let controller = JobController::new(provider.clone(), store, layout.clone());
        let generator = Arc::new(
            Generator::new(provider.clone(), layout.clone())
                .with_poll_interval(config.poll_interval),
        );
        Ok(Self {
            config,
            provider,
            layout,
            controller,
            generator,
        })
    }

    /// Build from environment variables.
    pub fn from_env() -> EngineResult<Self> {
        Self::new(EngineConfig::from_env())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Blocking generation operations behind the provider.
    pub fn generator(&self) -> Arc<Generator> {
        self.generator.clone()
    }

    /// Start a chained workflow backed by this engine's provider.
    pub fn bridge(&self, name: impl Into<String>) -> Bridge {
        Bridge::new(name, self.generator.clone())
    }

    /// Start an asynchronous generation job. Returns the job record.
    pub async fn generate_start(&self, params: GenerateStartParams) -> Value {
        match self.controller.submit(params).await {
            Ok(record) => job_value(serde_json::to_value(&record)),
            Err(e) => e.error_record(),
        }
    }

    /// Current state of a job, probing the remote operation once.
    pub async fn generate_get(&self, job_id: &str) -> Value {
        match self.controller.poll(&JobId::from(job_id)).await {
            Ok(record) => job_value(serde_json::to_value(&record)),
            Err(e) => e.error_record(),
        }
    }

    /// Request cancellation of a job.
    pub async fn generate_cancel(&self, job_id: &str) -> Value {
        match self.controller.cancel(&JobId::from(job_id)).await {
            Ok(record) => job_value(serde_json::to_value(&record)),
            Err(e) => e.error_record(),
        }
    }

    /// Extract a single frame into the frames directory.
    pub async fn extract_frame(&self, params: ExtractFrameParams) -> Value {
        if let Err(e) = params.validate() {
            return EngineError::validation(e.to_string()).error_record();
        }
        let video = PathBuf::from(&params.video_path);
        match extract_frame_to_dir(&video, params.time_offset, self.layout.frames_dir()).await {
            Ok(frame) => json!({
                "path": frame.display().to_string(),
                "url": self.layout.file_url(&frame),
            }),
            Err(e) => EngineError::from(e).error_record(),
        }
    }

    /// Stitch clips into one timeline.
    pub async fn stitch_videos(&self, params: StitchVideosParams) -> Value {
        if let Err(e) = params.validate() {
            return EngineError::validation(e.to_string()).error_record();
        }
        let paths: Vec<PathBuf> = params.video_paths.iter().map(PathBuf::from).collect();
        match self
            .generator
            .stitch(&paths, params.overlap, None)
            .await
        {
            Ok(result) => result.to_value(),
            Err(e) => e.error_record(),
        }
    }

    /// Known models with capability flags, optionally merged with the
    /// Daydreams router listing.
    pub async fn list_models(&self, include_remote: bool) -> Value {
        let models: Vec<Value> = ModelCatalog::known_models()
            .iter()
            .filter_map(|spec| serde_json::to_value(spec).ok())
            .collect();
        let mut record = json!({
            "default_model": DEFAULT_MODEL,
            "models": models,
        });

        if include_remote && self.config.provider == ProviderKind::Daydreams {
            match self.remote_models().await {
                Ok(remote) => {
                    record["remote_models"] = remote;
                }
                Err(e) => warn!("Remote model listing failed: {}", e),
            }
        }
        record
    }

    async fn remote_models(&self) -> EngineResult<Value> {
        let key = self
            .config
            .daydreams_api_key
            .as_deref()
            .ok_or_else(|| EngineError::config_error("DAYDREAMS_API_KEY not set"))?;
        let provider = match &self.config.daydreams_base_url {
            Some(base) => DaydreamsProvider::with_base_url(key, base)?,
            None => DaydreamsProvider::new(key)?,
        };
        Ok(provider.list_models().await?)
    }

    /// Plan a multi-clip storyboard with Gemini.
    pub async fn plan_scenes(&self, request: PlanRequest) -> Value {
        let planner = match self.build_planner() {
            Ok(planner) => planner,
            Err(e) => return e.error_record(),
        };
        match planner.plan_scenes(&request).await {
            Ok(plan) => job_value(serde_json::to_value(&plan)),
            Err(e) => EngineError::from(e).error_record(),
        }
    }

    /// Render every clip of a plan and optionally stitch the results.
    ///
    /// On a mid-plan failure the record carries `clip_index` and the
    /// completed prefix under `completed`.
    pub async fn execute_scene_plan(&self, source: PlanSource, options: PlanOptions) -> Value {
        match execute_plan(source, &options, self.generator.as_ref(), None, None, None).await {
            Ok(execution) => execution.to_value(),
            Err(EngineError::PlanFailed {
                clip_index,
                message,
                completed,
            }) => {
                let err = EngineError::PlanFailed {
                    clip_index,
                    message,
                    completed: Vec::new(),
                };
                let mut record = err.error_record();
                record["clip_index"] = json!(clip_index);
                record["completed"] =
                    Value::Array(completed.iter().map(|r| r.to_value()).collect());
                record
            }
            Err(e) => e.error_record(),
        }
    }

    /// Resource: persisted job record (`job://{id}`), without a remote probe.
    pub async fn job_record(&self, job_id: &str) -> Value {
        let store = JobStore::new(&self.layout);
        match store.load(&JobId::from(job_id)).await {
            Ok(Some(record)) => job_value(serde_json::to_value(&record)),
            Ok(None) => EngineError::JobNotFound(job_id.to_string()).error_record(),
            Err(e) => EngineError::from(e).error_record(),
        }
    }

    /// Resource: newest generated videos (`videos://recent/{limit}`).
    pub async fn recent_videos(&self, limit: usize) -> Value {
        match self.layout.recent_videos(limit).await {
            Ok(videos) => json!({
                "count": videos.len(),
                "videos": videos,
            }),
            Err(e) => EngineError::from(e).error_record(),
        }
    }

    /// Environment diagnostics.
    pub async fn preflight(&self) -> Value {
        let probe = self.layout.temp_path(".preflight");
        let output_writable = tokio::fs::write(&probe, b"ok").await.is_ok();
        if output_writable {
            let _ = tokio::fs::remove_file(&probe).await;
        }

        json!({
            "ffmpeg": check_ffmpeg().is_ok(),
            "ffprobe": check_ffprobe().is_ok(),
            "provider": self.provider.name(),
            "api_key_present": self.config.api_key_present(),
            "output_dir": self.layout.base_dir().display().to_string(),
            "output_writable": output_writable,
        })
    }

    /// Package version record.
    pub fn version(&self) -> Value {
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "default_model": DEFAULT_MODEL,
        })
    }

    fn build_planner(&self) -> EngineResult<PlannerClient> {
        self.config.build_planner()
    }
}

fn job_value(value: Result<Value, serde_json::Error>) -> Value {
    match value {
        Ok(value) => value,
        Err(e) => EngineError::from(e).error_record(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_defaults() {
        let extract: ExtractFrameParams =
            serde_json::from_value(json!({"video_path": "clip.mp4"})).unwrap();
        assert!((extract.time_offset - (-1.0)).abs() < 1e-9);

        let stitch: StitchVideosParams =
            serde_json::from_value(json!({"video_paths": ["a.mp4", "b.mp4"]})).unwrap();
        assert!((stitch.overlap - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_param_validation() {
        let extract = ExtractFrameParams {
            video_path: String::new(),
            time_offset: -1.0,
        };
        assert!(extract.validate().is_err());

        let stitch = StitchVideosParams {
            video_paths: vec!["only.mp4".to_string()],
            overlap: 1.0,
        };
        assert!(stitch.validate().is_err());
    }
}
