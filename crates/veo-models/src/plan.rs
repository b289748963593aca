//! Scene plan schema.
//!
//! A scene plan is a structured, multi-clip storyboard produced by the LLM
//! planner and consumed by the executor. The `JsonSchema` derives are shipped
//! to the planner as the required response schema, so field names and
//! defaults here are part of the planner contract.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Technical camera details for a specific clip.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Shot {
    /// How the shot is framed and the lens used
    pub composition: String,
    /// Camera movement during the shot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_motion: Option<String>,
    /// Frames per second look (24 fps is cinematic)
    #[serde(default = "default_frame_rate")]
    pub frame_rate: String,
    /// Stylistic film grain amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub film_grain: Option<f64>,
    /// Camera lens, shot type, and equipment style
    pub camera: String,
}

fn default_frame_rate() -> String {
    "24 fps".to_string()
}

/// Character appearance and wardrobe within a specific clip.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Subject {
    /// Full descriptive prompt of the character for this shot
    pub description: String,
    /// Outfit worn in this clip
    pub wardrobe: String,
}

/// Setting and environment of the clip.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    /// Physical place where the scene occurs
    pub location: String,
    /// Time of day, which heavily influences lighting
    #[serde(default = "default_time_of_day")]
    pub time_of_day: String,
    /// Environmental details that reinforce the setting
    pub environment: String,
}

fn default_time_of_day() -> String {
    "mid-day".to_string()
}

/// Actions and props within the clip.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VisualDetails {
    /// What the character is doing in the scene
    pub action: String,
    /// Objects shown or used during the clip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<String>,
}

/// Lighting, tone, and colour direction for the clip.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Cinematography {
    /// Lighting direction for this shot (e.g. high-key, moody)
    pub lighting: String,
    /// Emotional tone of the clip
    pub tone: String,
    /// Colour grade/look for the clip
    pub color_grade: String,
}

/// Sound elements specific to this clip.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct AudioTrack {
    /// Lyrics to be lip-synced or heard
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    /// Emotional tone of the vocal performance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    /// Rhythm and cadence of the lyrical delivery
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    /// URL to a pre-existing audio file for this clip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wave_download_url: Option<String>,
    /// Reference video for music or mood
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_reference: Option<String>,
    /// Genre/tempo/musical notes for the track
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

/// Spoken lines and how they are presented.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Dialogue {
    /// The character who is speaking
    pub character: String,
    /// The exact line of dialogue or lyrics
    pub line: String,
    /// Whether subtitles should appear
    #[serde(default)]
    pub subtitles: bool,
}

/// Controls for the character's animated performance in this clip.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct Performance {
    /// How exaggerated the mouth shapes should be (0=subtle, 1=exaggerated)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mouth_shape_intensity: Option<f64>,
    /// Fraction of time the character looks into camera
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eye_contact_ratio: Option<f64>,
}

/// A single video segment or shot.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Clip {
    /// Unique identifier for this clip
    pub id: String,
    pub shot: Shot,
    pub subject: Subject,
    pub scene: Scene,
    pub visual_details: VisualDetails,
    pub cinematography: Cinematography,
    #[serde(default)]
    pub audio_track: AudioTrack,
    pub dialogue: Dialogue,
    #[serde(default)]
    pub performance: Performance,
    /// Duration of the clip in seconds
    pub duration_sec: u32,
    /// Aspect ratio for the clip (e.g. "16:9", "9:16")
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
}

fn default_aspect_ratio() -> String {
    "16:9".to_string()
}

/// A consistent profile of a character's core attributes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CharacterProfile {
    /// Primary name of the character
    pub name: String,
    /// Apparent age
    pub age: u32,
    /// Height, optionally in multiple units
    pub height: String,
    /// Body type and physique description
    pub build: String,
    /// Skin tone description
    pub skin_tone: String,
    /// Hair colour, length, and style
    pub hair: String,
    /// Eye shape and colour details
    pub eyes: String,
    /// Unique features like tattoos, scars, or piercings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distinguishing_marks: Option<String>,
    /// Typical personality and mood
    pub demeanour: String,
    /// Primary outfit for the character
    pub default_outfit: String,
    /// Baseline mouth movement exaggeration (0=subtle, 1=exaggerated)
    pub mouth_shape_intensity: f64,
    /// Baseline fraction of time looking into camera
    pub eye_contact_ratio: f64,
}

/// Structured storyboard: characters plus an ordered list of clips.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScenePlan {
    pub characters: Vec<CharacterProfile>,
    pub clips: Vec<Clip>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_clip_json() -> serde_json::Value {
        serde_json::json!({
            "id": "clip-1",
            "shot": {"composition": "wide shot, 35mm", "camera": "handheld"},
            "subject": {"description": "a lighthouse keeper", "wardrobe": "wool coat"},
            "scene": {"location": "rocky coast", "environment": "storm clouds gathering"},
            "visual_details": {"action": "climbs the spiral stairs"},
            "cinematography": {"lighting": "moody", "tone": "tense", "color_grade": "teal"},
            "dialogue": {"character": "Keeper", "line": "The light must not go out."},
            "duration_sec": 8
        })
    }

    #[test]
    fn test_clip_defaults() {
        let clip: Clip = serde_json::from_value(sample_clip_json()).unwrap();
        assert_eq!(clip.aspect_ratio, "16:9");
        assert_eq!(clip.shot.frame_rate, "24 fps");
        assert_eq!(clip.scene.time_of_day, "mid-day");
        assert!(!clip.dialogue.subtitles);
    }

    #[test]
    fn test_plan_round_trip() {
        let plan = ScenePlan {
            characters: vec![],
            clips: vec![serde_json::from_value(sample_clip_json()).unwrap()],
        };
        let json = serde_json::to_string(&plan).unwrap();
        let parsed: ScenePlan = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.clips.len(), 1);
        assert_eq!(parsed.clips[0].id, "clip-1");
    }

    #[test]
    fn test_schema_names_clips() {
        let schema = schemars::schema_for!(ScenePlan);
        let json = serde_json::to_value(&schema).unwrap();
        assert!(json["properties"].get("clips").is_some());
        assert!(json["properties"].get("characters").is_some());
    }
}
