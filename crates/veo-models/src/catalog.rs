//! Video model catalog and capability flags.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default model used when none is specified.
pub const DEFAULT_MODEL: &str = "veo-3.0-fast-generate-preview";

/// Capabilities and tuning for a single model.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ModelSpec {
    /// Canonical model identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Whether the model accepts an explicit duration
    pub supports_duration: bool,
    /// Whether the model supports generated audio
    pub supports_audio: bool,
    /// Whether the model accepts an aspect ratio
    pub supports_aspect_ratio: bool,
    /// Default clip duration in seconds
    pub default_duration: u32,
    /// Rough wall-clock estimate for a generation, used to scale progress
    pub estimated_generation_secs: u64,
}

/// Registry of known models, alias normalization, and provider mappings.
pub struct ModelCatalog;

impl ModelCatalog {
    /// Resolve aliases and strip the `models/` prefix.
    pub fn normalize(model: Option<&str>) -> String {
        let Some(model) = model else {
            return DEFAULT_MODEL.to_string();
        };
        let base = model.trim();
        if base.is_empty() {
            return DEFAULT_MODEL.to_string();
        }
        let base = base.strip_prefix("models/").unwrap_or(base);
        match base {
            "veo-3" | "veo-3.0" | "google/veo-3" => "veo-3.0-generate-preview",
            "veo-3-fast" | "veo-3.0-fast" | "google/veo-3-fast" => "veo-3.0-fast-generate-preview",
            other => other,
        }
        .to_string()
    }

    /// Capability record for a model, falling back to the default model.
    pub fn spec(model: &str) -> ModelSpec {
        let normalized = Self::normalize(Some(model));
        Self::known_models()
            .into_iter()
            .find(|spec| spec.id == normalized)
            .unwrap_or_else(|| {
                Self::known_models()
                    .into_iter()
                    .find(|spec| spec.id == DEFAULT_MODEL)
                    .unwrap_or(ModelSpec {
                        id: normalized,
                        name: "Unknown".to_string(),
                        supports_duration: false,
                        supports_audio: false,
                        supports_aspect_ratio: true,
                        default_duration: 8,
                        estimated_generation_secs: 120,
                    })
            })
    }

    /// All models the SDK knows about.
    pub fn known_models() -> Vec<ModelSpec> {
        vec![
            ModelSpec {
                id: "veo-3.0-fast-generate-preview".to_string(),
                name: "Veo 3.0 Fast".to_string(),
                supports_duration: false,
                supports_audio: true,
                supports_aspect_ratio: true,
                default_duration: 8,
                estimated_generation_secs: 60,
            },
            ModelSpec {
                id: "veo-3.0-generate-preview".to_string(),
                name: "Veo 3.0".to_string(),
                supports_duration: false,
                supports_audio: true,
                supports_aspect_ratio: true,
                default_duration: 8,
                estimated_generation_secs: 120,
            },
            ModelSpec {
                id: "veo-2.0-generate-001".to_string(),
                name: "Veo 2.0".to_string(),
                supports_duration: true,
                supports_audio: false,
                supports_aspect_ratio: true,
                default_duration: 5,
                estimated_generation_secs: 180,
            },
        ]
    }

    /// Router model id for the Daydreams provider.
    pub fn daydreams_model(model: &str) -> Option<&'static str> {
        match Self::normalize(Some(model)).as_str() {
            "veo-3.0-generate-preview" | "veo-3.0-generate-001" => Some("google/veo-3"),
            "veo-3.0-fast-generate-preview" | "veo-3.0-fast-generate-001" => {
                Some("google/veo-3-fast")
            }
            _ => None,
        }
    }

    /// Router path slug for the Daydreams provider.
    pub fn daydreams_slug(model: &str) -> Option<String> {
        let normalized = Self::normalize(Some(model));
        match normalized.as_str() {
            "veo-3.0-generate-preview" | "veo-3.0-generate-001" => Some("veo-3".to_string()),
            "veo-3.0-fast-generate-preview" | "veo-3.0-fast-generate-001" => {
                Some("veo-3-fast".to_string())
            }
            _ if normalized.contains('/') => {
                normalized.rsplit('/').next().map(|s| s.to_string())
            }
            _ => None,
        }
    }

    /// Aspect ratios a model accepts.
    pub fn allowed_aspect_ratios(model: &str) -> &'static [&'static str] {
        let normalized = Self::normalize(Some(model));
        if normalized.starts_with("veo-2.0") {
            &["16:9", "9:16"]
        } else {
            &["16:9"]
        }
    }
}
