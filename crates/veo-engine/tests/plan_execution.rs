//! Scene-plan execution against a fake clip source.

mod common;

use common::{Call, FakeClips};
use std::path::PathBuf;
use tempfile::TempDir;

use veo_engine::{execute_plan, EngineError, PlanOptions, PlanSource};
use veo_models::ScenePlan;

fn clip_json(id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "shot": {"composition": "wide shot, 35mm", "camera": "handheld"},
        "subject": {"description": "a lighthouse keeper", "wardrobe": "wool coat"},
        "scene": {"location": "rocky coast", "environment": "storm clouds"},
        "visual_details": {"action": "walks the shoreline"},
        "cinematography": {"lighting": "moody", "tone": "tense", "color_grade": "teal"},
        "dialogue": {"character": "", "line": ""},
        "duration_sec": 8
    })
}

fn plan(clip_count: usize) -> ScenePlan {
    let clips: Vec<serde_json::Value> = (0..clip_count)
        .map(|i| clip_json(&format!("clip-{}", i + 1)))
        .collect();
    serde_json::from_value(serde_json::json!({
        "characters": [],
        "clips": clips,
    }))
    .unwrap()
}

#[tokio::test]
async fn auto_seed_carries_tail_frame_forward() {
    let dir = TempDir::new().unwrap();
    let fake = FakeClips::new(dir.path());

    let execution = execute_plan(
        PlanSource::Plan(plan(3)),
        &PlanOptions::default(),
        &fake,
        None,
        None,
        None,
    )
    .await
    .unwrap();

    assert_eq!(execution.clip_results.len(), 3);
    assert!(execution.final_result.is_some());

    // First clip from text, the rest seeded from the previous clip's tail
    let calls = fake.calls();
    let text_count = calls
        .iter()
        .filter(|c| matches!(c, Call::Text { .. }))
        .count();
    let image_count = calls
        .iter()
        .filter(|c| matches!(c, Call::Image { .. }))
        .count();
    assert_eq!(text_count, 1);
    assert_eq!(image_count, 2);

    let frames: Vec<(PathBuf, f64)> = calls
        .iter()
        .filter_map(|c| match c {
            Call::Frame { video, offset } => Some((video.clone(), *offset)),
            _ => None,
        })
        .collect();
    assert_eq!(frames.len(), 2);
    assert!(frames[0].0.ends_with("clip_0.mp4"));
    assert!(frames[1].0.ends_with("clip_1.mp4"));
    assert!((frames[0].1 - (-1.0)).abs() < 1e-9);

    let seeds: Vec<PathBuf> = calls
        .iter()
        .filter_map(|c| match c {
            Call::Image { image, .. } => Some(image.clone()),
            _ => None,
        })
        .collect();
    assert!(seeds[0].ends_with("seed_clip_0.jpg"));
    assert!(seeds[1].ends_with("seed_clip_1.jpg"));
}

#[tokio::test]
async fn clip_failure_keeps_completed_prefix() {
    let dir = TempDir::new().unwrap();
    let fake = FakeClips::failing_at(dir.path(), 1);

    let err = execute_plan(
        PlanSource::Plan(plan(3)),
        &PlanOptions::default(),
        &fake,
        None,
        None,
        None,
    )
    .await
    .unwrap_err();

    match err {
        EngineError::PlanFailed {
            clip_index,
            completed,
            ..
        } => {
            assert_eq!(clip_index, 1);
            assert_eq!(completed.len(), 1);
            assert!(completed[0].path.as_ref().unwrap().ends_with("clip_0.mp4"));
        }
        other => panic!("expected PlanFailed, got {:?}", other),
    }

    // Nothing was stitched after the abort
    assert!(!fake.calls().iter().any(|c| matches!(c, Call::Stitch { .. })));
}

#[tokio::test]
async fn image_provider_overrides_carry_forward() {
    let dir = TempDir::new().unwrap();
    let fake = FakeClips::new(dir.path());

    let poster = dir.path().join("poster.png");
    std::fs::write(&poster, b"png").unwrap();
    let poster_for_hook = poster.clone();
    let hook = move |_: &veo_models::Clip, _: usize, _: &ScenePlan| Some(poster_for_hook.clone());

    execute_plan(
        PlanSource::Plan(plan(3)),
        &PlanOptions::default(),
        &fake,
        Some(&hook),
        None,
        None,
    )
    .await
    .unwrap();

    // Every clip renders from the hook's image, never from a carried frame
    let seeds: Vec<PathBuf> = fake
        .calls()
        .iter()
        .filter_map(|c| match c {
            Call::Image { image, .. } => Some(image.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(seeds.len(), 3);
    assert!(seeds.iter().all(|s| *s == poster));
}

#[tokio::test]
async fn stitch_can_be_disabled() {
    let dir = TempDir::new().unwrap();
    let fake = FakeClips::new(dir.path());

    let options = PlanOptions {
        stitch: false,
        auto_seed_last_frame: false,
        ..PlanOptions::default()
    };
    let execution = execute_plan(PlanSource::Plan(plan(2)), &options, &fake, None, None, None)
        .await
        .unwrap();

    assert_eq!(execution.clip_results.len(), 2);
    assert!(execution.final_result.is_none());
    assert!(!fake.calls().iter().any(|c| matches!(c, Call::Stitch { .. })));
    assert!(!fake.calls().iter().any(|c| matches!(c, Call::Frame { .. })));
}

#[tokio::test]
async fn stitch_uses_configured_overlap() {
    let dir = TempDir::new().unwrap();
    let fake = FakeClips::new(dir.path());

    let options = PlanOptions {
        overlap: 0.5,
        auto_seed_last_frame: false,
        ..PlanOptions::default()
    };
    let execution = execute_plan(PlanSource::Plan(plan(2)), &options, &fake, None, None, None)
        .await
        .unwrap();
    assert!(execution.final_result.is_some());

    let stitch = fake
        .calls()
        .into_iter()
        .find_map(|c| match c {
            Call::Stitch { inputs, overlap } => Some((inputs, overlap)),
            _ => None,
        })
        .unwrap();
    assert_eq!(stitch.0.len(), 2);
    assert!((stitch.1 - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn empty_plan_is_rejected() {
    let dir = TempDir::new().unwrap();
    let fake = FakeClips::new(dir.path());

    let err = execute_plan(
        PlanSource::Value(serde_json::json!({"characters": [], "clips": []})),
        &PlanOptions::default(),
        &fake,
        None,
        None,
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}
