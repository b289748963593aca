#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use veo_client::GenerateOptions;
use veo_engine::{ClipSource, EngineError, EngineResult, ProgressFn};
use veo_models::VideoResult;

/// One recorded call against the fake clip source.
#[derive(Debug, Clone)]
pub enum Call {
    Text { prompt: String },
    Image { image: PathBuf, prompt: String },
    Frame { video: PathBuf, offset: f64 },
    Stitch { inputs: Vec<PathBuf>, overlap: f64 },
}

/// In-memory clip source that fabricates artifacts on disk and records
/// every call for later assertion.
pub struct FakeClips {
    dir: PathBuf,
    calls: Mutex<Vec<Call>>,
    generated: AtomicUsize,
    fail_at: Option<usize>,
}

impl FakeClips {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            calls: Mutex::new(Vec::new()),
            generated: AtomicUsize::new(0),
            fail_at: None,
        }
    }

    /// Fail the n-th generation call (0-based), counting text and image
    /// calls together.
    pub fn failing_at(dir: impl Into<PathBuf>, index: usize) -> Self {
        let mut fake = Self::new(dir);
        fake.fail_at = Some(index);
        fake
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_clip(&self, prompt: &str) -> EngineResult<VideoResult> {
        let index = self.generated.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == Some(index) {
            return Err(EngineError::validation(format!(
                "synthetic failure at generation {}",
                index
            )));
        }
        let path = self.dir.join(format!("clip_{}.mp4", index));
        std::fs::write(&path, b"clip").unwrap();

        let mut result = VideoResult::new();
        result.prompt = prompt.to_string();
        result.path = Some(path);
        result.update_progress("Complete", 100);
        Ok(result)
    }
}

#[async_trait]
impl ClipSource for FakeClips {
    async fn text_to_video(
        &self,
        prompt: &str,
        _model: &str,
        _options: &GenerateOptions,
        _on_progress: Option<&ProgressFn>,
    ) -> EngineResult<VideoResult> {
        self.record(Call::Text {
            prompt: prompt.to_string(),
        });
        self.next_clip(prompt)
    }

    async fn image_to_video(
        &self,
        image: &Path,
        prompt: &str,
        _model: &str,
        _options: &GenerateOptions,
        _on_progress: Option<&ProgressFn>,
    ) -> EngineResult<VideoResult> {
        self.record(Call::Image {
            image: image.to_path_buf(),
            prompt: prompt.to_string(),
        });
        self.next_clip(prompt)
    }

    async fn extract_seed_frame(&self, video: &Path, offset: f64) -> EngineResult<PathBuf> {
        self.record(Call::Frame {
            video: video.to_path_buf(),
            offset,
        });
        let stem = video
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("frame");
        let path = self.dir.join(format!("seed_{}.jpg", stem));
        std::fs::write(&path, b"frame").unwrap();
        Ok(path)
    }

    async fn stitch(
        &self,
        paths: &[PathBuf],
        overlap: f64,
        _on_progress: Option<&ProgressFn>,
    ) -> EngineResult<VideoResult> {
        self.record(Call::Stitch {
            inputs: paths.to_vec(),
            overlap,
        });
        let path = self.dir.join("stitched.mp4");
        std::fs::write(&path, b"stitched").unwrap();

        let mut result = VideoResult::new();
        result.path = Some(path);
        result.update_progress("Complete", 100);
        Ok(result)
    }
}
