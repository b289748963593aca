//! Scene-plan execution.
//!
//! Renders every clip of a plan in order, optionally carrying the last
//! frame of each clip forward as the seed for the next one, then stitches
//! the results. A clip failure aborts the remaining pipeline; the error
//! carries the completed prefix so callers keep what already rendered.

use std::path::PathBuf;
use tracing::{info, warn};

use veo_client::GenerateOptions;
use veo_models::{Clip, ModelCatalog, ScenePlan, VideoResult};

use crate::error::{EngineError, EngineResult};
use crate::generate::{ClipSource, ProgressFn};

/// Where the plan comes from.
pub enum PlanSource {
    /// Already-parsed plan
    Plan(ScenePlan),
    /// Raw JSON value
    Value(serde_json::Value),
    /// Path to a plan JSON file
    File(PathBuf),
}

/// Execution options.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Model for every clip; catalog default when None
    pub model: Option<String>,
    /// Overlap trim in seconds when stitching
    pub overlap: f64,
    /// Whether to stitch the rendered clips into one timeline
    pub stitch: bool,
    /// Seed each clip from the previous clip's tail frame
    pub auto_seed_last_frame: bool,
    /// Frame offset for auto seeding (negative = from end)
    pub seed_frame_offset: f64,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            model: None,
            overlap: 1.0,
            stitch: true,
            auto_seed_last_frame: true,
            seed_frame_offset: -1.0,
        }
    }
}

/// Optional per-clip seed image hook.
pub type ImageProvider = dyn Fn(&Clip, usize, &ScenePlan) -> Option<PathBuf> + Send + Sync;

/// Optional prompt override hook.
pub type PromptBuilder = dyn Fn(&Clip) -> String + Send + Sync;

/// Outcome of a plan run.
#[derive(Debug)]
pub struct PlanExecution {
    /// Per-clip results in plan order
    pub clip_results: Vec<VideoResult>,
    /// Stitched timeline when stitching was requested and >= 2 clips rendered
    pub final_result: Option<VideoResult>,
}

impl PlanExecution {
    /// Flat JSON record for the tool boundary.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "clip_results": self.clip_results.iter().map(|r| r.to_value()).collect::<Vec<_>>(),
            "final_result": self.final_result.as_ref().map(|r| r.to_value()),
        })
    }
}

/// Render all clips of a plan, sequentially, and optionally stitch.
pub async fn execute_plan(
    source: PlanSource,
    options: &PlanOptions,
    clips: &dyn ClipSource,
    image_provider: Option<&ImageProvider>,
    prompt_builder: Option<&PromptBuilder>,
    on_progress: Option<&ProgressFn>,
) -> EngineResult<PlanExecution> {
    let plan = resolve_plan(source)?;
    if plan.clips.is_empty() {
        return Err(EngineError::validation("Plan contains no clips"));
    }

    let model = ModelCatalog::normalize(options.model.as_deref());
    let total = plan.clips.len();
    info!(clips = total, model = %model, "Executing scene plan");

    let mut clip_results: Vec<VideoResult> = Vec::with_capacity(total);
    let mut carried_seed: Option<PathBuf> = None;

    for (index, clip) in plan.clips.iter().enumerate() {
        let prompt = match prompt_builder {
            Some(builder) => builder(clip),
            None => default_prompt(clip),
        };

        let mut clip_options = GenerateOptions {
            aspect_ratio: Some(clip.aspect_ratio.clone()),
            duration_seconds: Some(clip.duration_sec),
            ..GenerateOptions::default()
        };
        if clip.duration_sec == 0 {
            clip_options.duration_seconds = None;
        }

        // Explicit per-clip seed beats the auto-seed carry-forward
        let seed = image_provider
            .and_then(|provider| provider(clip, index, &plan))
            .or_else(|| carried_seed.clone());

        let label = format!("Clip {}/{}", index + 1, total);
        if let Some(callback) = on_progress {
            callback(&label, ((index * 100) / total) as u8);
        }

        let rendered = match &seed {
            Some(image) => {
                clips
                    .image_to_video(image, &prompt, &model, &clip_options, on_progress)
                    .await
            }
            None => {
                clips
                    .text_to_video(&prompt, &model, &clip_options, on_progress)
                    .await
            }
        };

        let result = match rendered {
            Ok(result) => result,
            Err(e) => {
                return Err(EngineError::PlanFailed {
                    clip_index: index,
                    message: e.to_string(),
                    completed: clip_results,
                });
            }
        };

        // Carry the tail frame forward before the next clip renders
        if options.auto_seed_last_frame && index + 1 < total {
            carried_seed = match &result.path {
                Some(path) => {
                    match clips
                        .extract_seed_frame(path, options.seed_frame_offset)
                        .await
                    {
                        Ok(frame) => Some(frame),
                        Err(e) => {
                            warn!(clip = index, "Seed frame extraction failed: {}", e);
                            None
                        }
                    }
                }
                None => None,
            };
        }

        clip_results.push(result);
    }

    let clip_paths: Vec<PathBuf> = clip_results
        .iter()
        .filter_map(|r| r.path.clone())
        .collect();

    let final_result = if options.stitch && clip_paths.len() >= 2 {
        if let Some(callback) = on_progress {
            callback("Stitching", 95);
        }
        Some(clips.stitch(&clip_paths, options.overlap, on_progress).await?)
    } else {
        None
    };

    Ok(PlanExecution {
        clip_results,
        final_result,
    })
}

fn resolve_plan(source: PlanSource) -> EngineResult<ScenePlan> {
    match source {
        PlanSource::Plan(plan) => Ok(plan),
        PlanSource::Value(value) => serde_json::from_value(value)
            .map_err(|e| EngineError::validation(format!("Malformed plan: {}", e))),
        PlanSource::File(path) => {
            let text = std::fs::read_to_string(&path).map_err(|e| {
                EngineError::validation(format!("Cannot read plan {}: {}", path.display(), e))
            })?;
            serde_json::from_str(&text).map_err(|e| {
                EngineError::validation(format!("Malformed plan {}: {}", path.display(), e))
            })
        }
    }
}

/// Compose a generation prompt from a clip's structured fields.
pub fn default_prompt(clip: &Clip) -> String {
    let mut lines: Vec<String> = vec![
        format!("Clip ID: {}", clip.id),
        format!("Shot: {}", clip.shot.composition),
    ];
    if !clip.shot.camera.is_empty() {
        lines.push(format!("Camera setup: {}", clip.shot.camera));
    }
    if let Some(motion) = &clip.shot.camera_motion {
        lines.push(format!("Camera motion: {}", motion));
    }
    lines.push(format!("Subject: {}", clip.subject.description));
    lines.push(format!("Wardrobe: {}", clip.subject.wardrobe));
    lines.push(format!(
        "Environment: {} during {}",
        clip.scene.location, clip.scene.time_of_day
    ));
    if !clip.scene.environment.is_empty() {
        lines.push(format!("Setting details: {}", clip.scene.environment));
    }
    lines.push(format!("Action: {}", clip.visual_details.action));
    if let Some(props) = &clip.visual_details.props {
        lines.push(format!("Props: {}", props));
    }
    lines.push(format!(
        "Cinematography: lighting {}; tone {}; grade {}",
        clip.cinematography.lighting, clip.cinematography.tone, clip.cinematography.color_grade
    ));
    lines.push(format!("Aspect ratio: {}", clip.aspect_ratio));
    if !clip.dialogue.line.is_empty() {
        let attribution = if clip.dialogue.character.is_empty() {
            "Dialogue"
        } else {
            &clip.dialogue.character
        };
        lines.push(format!("Dialogue: [{}] {}", attribution, clip.dialogue.line));
    }

    let mut audio_cues: Vec<String> = Vec::new();
    if let Some(lyrics) = &clip.audio_track.lyrics {
        audio_cues.push(format!("lyrics '{}'", lyrics));
    }
    if let Some(emotion) = &clip.audio_track.emotion {
        audio_cues.push(format!("emotion {}", emotion));
    }
    if let Some(flow) = &clip.audio_track.flow {
        audio_cues.push(format!("flow {}", flow));
    }
    if !audio_cues.is_empty() {
        lines.push(format!("Audio cues: {}", audio_cues.join("; ")));
    }

    lines.push("Render as a polished cinematic scene with synchronized audio.".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_clip() -> Clip {
        serde_json::from_value(serde_json::json!({
            "id": "clip-1",
            "shot": {"composition": "wide shot", "camera": "35mm", "camera_motion": "slow dolly"},
            "subject": {"description": "a lighthouse keeper", "wardrobe": "wool coat"},
            "scene": {"location": "rocky coast", "environment": "storm clouds"},
            "visual_details": {"action": "climbs the stairs", "props": "brass lantern"},
            "cinematography": {"lighting": "moody", "tone": "tense", "color_grade": "teal"},
            "audio_track": {"emotion": "urgent"},
            "dialogue": {"character": "Keeper", "line": "The light must not go out."},
            "duration_sec": 8
        }))
        .unwrap()
    }

    #[test]
    fn test_default_prompt_lines() {
        let prompt = default_prompt(&sample_clip());

        assert!(prompt.starts_with("Clip ID: clip-1"));
        assert!(prompt.contains("Shot: wide shot"));
        assert!(prompt.contains("Camera motion: slow dolly"));
        assert!(prompt.contains("Environment: rocky coast during mid-day"));
        assert!(prompt.contains("Props: brass lantern"));
        assert!(prompt.contains("Dialogue: [Keeper] The light must not go out."));
        assert!(prompt.contains("Audio cues: emotion urgent"));
        assert!(prompt.ends_with("Render as a polished cinematic scene with synchronized audio."));
    }

    #[test]
    fn test_resolve_plan_malformed_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("plan.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = resolve_plan(PlanSource::File(path)).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        let missing = resolve_plan(PlanSource::File(dir.path().join("absent.json"))).unwrap_err();
        assert!(matches!(missing, EngineError::Validation(_)));
    }

    #[test]
    fn test_options_defaults() {
        let options = PlanOptions::default();
        assert!(options.stitch);
        assert!(options.auto_seed_last_frame);
        assert!((options.seed_frame_offset - (-1.0)).abs() < 1e-9);
        assert!((options.overlap - 1.0).abs() < 1e-9);
    }
}
