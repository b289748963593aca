//! Fluent multi-step workflow builder.
//!
//! Steps execute eagerly so a bad call fails at the call site; a parallel
//! append-only step log is kept for serialization and diagnostics. Each
//! builder owns its artifact list; nothing is shared between workflows.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use veo_client::GenerateOptions;
use veo_models::{
    ModelCatalog, StepAction, VideoResult, WorkflowRecord, WorkflowStep,
};

use crate::error::{EngineError, EngineResult};
use crate::generate::{ClipSource, ProgressFn};

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "mkv"];

/// Chained workflow over generation and stitching.
pub struct Bridge {
    source: Arc<dyn ClipSource>,
    record: WorkflowRecord,
    model: String,
    /// Ordered artifacts produced or registered so far
    artifacts: Vec<PathBuf>,
    /// Results for every generation/stitch step, in order
    results: Vec<VideoResult>,
    /// Media registered by `add_media`, consumed as the next seed
    pending_seed: Option<PathBuf>,
    progress: Option<Arc<ProgressFn>>,
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("record", &self.record)
            .field("model", &self.model)
            .field("artifacts", &self.artifacts)
            .field("results", &self.results)
            .field("pending_seed", &self.pending_seed)
            .finish_non_exhaustive()
    }
}

impl Bridge {
    pub fn new(name: impl Into<String>, source: Arc<dyn ClipSource>) -> Self {
        Self {
            source,
            record: WorkflowRecord::new(name),
            model: ModelCatalog::normalize(None),
            artifacts: Vec::new(),
            results: Vec::new(),
            pending_seed: None,
            progress: None,
        }
    }

    /// Set the model used by subsequent generate steps.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = ModelCatalog::normalize(Some(&model.into()));
        self
    }

    /// Attach a progress callback `(message, percent)`.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, u8) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Generate a clip, seeding from media registered by `add_media`
    /// when present.
    pub async fn generate(&mut self, prompt: &str) -> EngineResult<&mut Self> {
        self.generate_with(prompt, GenerateOptions::default()).await
    }

    /// Generate a clip with explicit options.
    pub async fn generate_with(
        &mut self,
        prompt: &str,
        options: GenerateOptions,
    ) -> EngineResult<&mut Self> {
        self.record.push(
            WorkflowStep::new(StepAction::Generate)
                .with_param("prompt", prompt)
                .with_param("model", self.model.as_str()),
        );

        let progress = self.progress.clone();
        let callback = progress.as_deref();

        let result = match self.pending_seed.take() {
            Some(seed) => {
                self.source
                    .image_to_video(&seed, prompt, &self.model, &options, callback)
                    .await?
            }
            None => {
                self.source
                    .text_to_video(prompt, &self.model, &options, callback)
                    .await?
            }
        };

        let path = result.path.clone().ok_or_else(|| {
            EngineError::validation("Generation returned no artifact path")
        })?;
        info!(workflow = %self.record.name, path = %path.display(), "Workflow clip ready");
        self.artifacts.push(path);
        self.results.push(result);
        Ok(self)
    }

    /// Register an externally supplied artifact.
    ///
    /// Videos join the stitchable artifact list; both images and videos
    /// become the seed for the next `generate`.
    pub fn add_media(&mut self, path: impl AsRef<Path>) -> EngineResult<&mut Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EngineError::validation(format!(
                "Media not found: {}",
                path.display()
            )));
        }

        self.record.push(
            WorkflowStep::new(StepAction::AddMedia)
                .with_param("path", path.display().to_string()),
        );

        if is_video(path) {
            self.artifacts.push(path.to_path_buf());
        }
        self.pending_seed = Some(path.to_path_buf());
        Ok(self)
    }

    /// Generate a transition clip between the last two artifacts.
    ///
    /// The transition is seeded from the tail frame of the second-to-last
    /// artifact and inserted before the final one.
    pub async fn generate_transition(&mut self, prompt: &str) -> EngineResult<&mut Self> {
        if self.artifacts.len() < 2 {
            return Err(EngineError::validation(
                "Transitions need at least two artifacts",
            ));
        }

        self.record.push(
            WorkflowStep::new(StepAction::GenerateTransition).with_param("prompt", prompt),
        );

        let before = self.artifacts[self.artifacts.len() - 2].clone();
        let seed = self.source.extract_seed_frame(&before, -1.0).await?;

        let progress = self.progress.clone();
        let result = self
            .source
            .image_to_video(
                &seed,
                prompt,
                &self.model,
                &GenerateOptions::default(),
                progress.as_deref(),
            )
            .await?;

        let path = result.path.clone().ok_or_else(|| {
            EngineError::validation("Transition returned no artifact path")
        })?;
        let insert_at = self.artifacts.len() - 1;
        self.artifacts.insert(insert_at, path);
        self.results.push(result);
        Ok(self)
    }

    /// Concatenate all accumulated artifacts into one, replacing the list.
    pub async fn stitch(&mut self, overlap: f64) -> EngineResult<&mut Self> {
        self.record
            .push(WorkflowStep::new(StepAction::Stitch).with_param("overlap", overlap));

        let progress = self.progress.clone();
        let result = self
            .source
            .stitch(&self.artifacts, overlap, progress.as_deref())
            .await?;

        let path = result.path.clone().ok_or_else(|| {
            EngineError::validation("Stitch returned no artifact path")
        })?;
        self.artifacts = vec![path];
        self.results.push(result);
        Ok(self)
    }

    /// Finalize, optionally copying the current artifact to `destination`.
    pub async fn save(&mut self, destination: Option<PathBuf>) -> EngineResult<PathBuf> {
        let current = self
            .artifacts
            .last()
            .cloned()
            .ok_or_else(|| EngineError::validation("Nothing to save"))?;

        let mut step = WorkflowStep::new(StepAction::Save);
        let saved = match destination {
            Some(dest) => {
                if let Some(parent) = dest.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::copy(&current, &dest).await?;
                step = step.with_param("destination", dest.display().to_string());
                dest
            }
            None => current,
        };
        self.record.push(step);

        info!(workflow = %self.record.name, path = %saved.display(), "Workflow saved");
        Ok(saved)
    }

    /// Ordered step log.
    pub fn workflow(&self) -> &WorkflowRecord {
        &self.record
    }

    /// Flat JSON record of the step log.
    pub fn to_record(&self) -> serde_json::Value {
        self.record.to_value()
    }

    /// Artifacts accumulated so far.
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    /// Results for each executed generation/stitch step.
    pub fn results(&self) -> &[VideoResult] {
        &self.results
    }
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
