//! Chained workflow builder over a fake clip source.

mod common;

use common::{Call, FakeClips};
use std::sync::Arc;
use tempfile::TempDir;

use veo_engine::{Bridge, EngineError};
use veo_models::{StepAction, WorkflowRecord};

fn fake(dir: &TempDir) -> Arc<FakeClips> {
    Arc::new(FakeClips::new(dir.path()))
}

#[tokio::test]
async fn generate_stitch_save_logs_every_step() {
    let dir = TempDir::new().unwrap();
    let clips = fake(&dir);
    let mut bridge = Bridge::new("two-shot", clips.clone());

    bridge.generate("a fox runs").await.unwrap();
    bridge.generate("the fox rests").await.unwrap();
    assert_eq!(bridge.artifacts().len(), 2);

    bridge.stitch(1.0).await.unwrap();
    assert_eq!(bridge.artifacts().len(), 1);

    let saved = bridge.save(None).await.unwrap();
    assert!(saved.ends_with("stitched.mp4"));

    let actions: Vec<StepAction> = bridge.workflow().steps.iter().map(|s| s.action).collect();
    assert_eq!(
        actions,
        vec![
            StepAction::Generate,
            StepAction::Generate,
            StepAction::Stitch,
            StepAction::Save,
        ]
    );

    // The step log survives a serialization round trip
    let parsed: WorkflowRecord = serde_json::from_value(bridge.to_record()).unwrap();
    assert_eq!(parsed.name, "two-shot");
    assert_eq!(parsed.steps.len(), 4);
    assert_eq!(parsed.steps[0].params["prompt"], "a fox runs");
    assert_eq!(parsed.steps[2].params["overlap"], 1.0);
}

#[tokio::test]
async fn added_image_seeds_the_next_generate() {
    let dir = TempDir::new().unwrap();
    let clips = fake(&dir);
    let mut bridge = Bridge::new("seeded", clips.clone());

    let poster = dir.path().join("poster.png");
    std::fs::write(&poster, b"png").unwrap();

    bridge.add_media(&poster).unwrap();
    // Images seed generation but are not stitchable artifacts
    assert!(bridge.artifacts().is_empty());

    bridge.generate("the poster comes alive").await.unwrap();
    assert_eq!(bridge.artifacts().len(), 1);

    match &clips.calls()[..] {
        [Call::Image { image, .. }] => assert_eq!(image, &poster),
        other => panic!("expected one seeded generation, got {:?}", other),
    }

    // The seed is consumed; the next generate starts from text
    bridge.generate("a new scene").await.unwrap();
    assert!(matches!(clips.calls()[1], Call::Text { .. }));
}

#[tokio::test]
async fn added_video_joins_the_timeline() {
    let dir = TempDir::new().unwrap();
    let clips = fake(&dir);
    let mut bridge = Bridge::new("imported", clips.clone());

    let intro = dir.path().join("intro.mp4");
    std::fs::write(&intro, b"video").unwrap();

    bridge.add_media(&intro).unwrap();
    assert_eq!(bridge.artifacts(), &[intro.clone()]);

    bridge.generate("continue the intro").await.unwrap();
    assert_eq!(bridge.artifacts().len(), 2);
    assert!(matches!(clips.calls()[0], Call::Image { .. }));
}

#[tokio::test]
async fn add_media_requires_an_existing_file() {
    let dir = TempDir::new().unwrap();
    let mut bridge = Bridge::new("missing", fake(&dir));

    let err = bridge.add_media(dir.path().join("absent.mp4")).unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn transition_is_inserted_before_the_final_artifact() {
    let dir = TempDir::new().unwrap();
    let clips = fake(&dir);
    let mut bridge = Bridge::new("transitions", clips.clone());

    bridge.generate("scene one").await.unwrap();
    bridge.generate("scene two").await.unwrap();
    bridge.generate_transition("crossfade through fog").await.unwrap();

    let artifacts = bridge.artifacts();
    assert_eq!(artifacts.len(), 3);
    assert!(artifacts[0].ends_with("clip_0.mp4"));
    assert!(artifacts[1].ends_with("clip_2.mp4"));
    assert!(artifacts[2].ends_with("clip_1.mp4"));

    // Seeded from the tail of the first scene
    let frame = clips
        .calls()
        .into_iter()
        .find_map(|c| match c {
            Call::Frame { video, offset } => Some((video, offset)),
            _ => None,
        })
        .unwrap();
    assert!(frame.0.ends_with("clip_0.mp4"));
    assert!((frame.1 - (-1.0)).abs() < 1e-9);
}

#[tokio::test]
async fn transition_needs_two_artifacts() {
    let dir = TempDir::new().unwrap();
    let mut bridge = Bridge::new("too-early", fake(&dir));

    bridge.generate("only one scene").await.unwrap();
    let err = bridge.generate_transition("fade").await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn save_copies_to_destination() {
    let dir = TempDir::new().unwrap();
    let clips = fake(&dir);
    let mut bridge = Bridge::new("export", clips);

    bridge.generate("a scene").await.unwrap();

    let dest = dir.path().join("exports").join("final.mp4");
    let saved = bridge.save(Some(dest.clone())).await.unwrap();
    assert_eq!(saved, dest);
    assert!(dest.is_file());
}

#[tokio::test]
async fn save_with_nothing_to_save_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut bridge = Bridge::new("empty", fake(&dir));

    let err = bridge.save(None).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}
