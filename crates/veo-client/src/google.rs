//! Google GenAI video generation adapter.
//!
//! Submits `predictLongRunning` requests, probes the returned operation and
//! downloads finished files with the API key header.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ClientError, ClientResult};
use crate::provider::{
    GenerateRequest, OperationStatus, RemoteOperation, VideoHandle, VideoProvider,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Google GenAI provider.
pub struct GoogleProvider {
    api_key: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<Instance>,
    parameters: Parameters,
}

#[derive(Debug, Serialize)]
struct Instance {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<InlineImage>,
}

#[derive(Debug, Serialize)]
struct InlineImage {
    #[serde(rename = "bytesBase64Encoded")]
    bytes_base64_encoded: String,
    #[serde(rename = "mimeType")]
    mime_type: String,
}

#[derive(Debug, Default, Serialize)]
struct Parameters {
    #[serde(rename = "aspectRatio", skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<String>,
    #[serde(rename = "negativePrompt", skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<String>,
    #[serde(rename = "personGeneration", skip_serializing_if = "Option::is_none")]
    person_generation: Option<String>,
    #[serde(rename = "durationSeconds", skip_serializing_if = "Option::is_none")]
    duration_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<String>,
    #[serde(rename = "generateAudio", skip_serializing_if = "Option::is_none")]
    generate_audio: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct OperationEnvelope {
    name: Option<String>,
    #[serde(default)]
    done: bool,
    error: Option<OperationError>,
    response: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    message: Option<String>,
}

impl GoogleProvider {
    pub fn new(api_key: impl Into<String>) -> ClientResult<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> ClientResult<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ClientError::config_error("GEMINI_API_KEY not set"));
        }
        Ok(Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        })
    }

    fn build_parameters(request: &GenerateRequest) -> ClientResult<Parameters> {
        let mode = if request.image.is_some() {
            "image"
        } else {
            "text"
        };
        let person_generation = resolve_person_generation(
            &request.model,
            mode,
            request.options.person_generation.as_deref(),
        )?;

        Ok(Parameters {
            aspect_ratio: request.options.aspect_ratio.clone(),
            negative_prompt: request.options.negative_prompt.clone(),
            person_generation,
            duration_seconds: request.options.duration_seconds,
            resolution: request.options.resolution.clone(),
            generate_audio: request.options.enable_audio,
        })
    }

    async fn load_seed_image(path: &Path) -> ClientResult<InlineImage> {
        if !path.exists() {
            return Err(ClientError::invalid_request(format!(
                "Seed image not found: {}",
                path.display()
            )));
        }
        let bytes = tokio::fs::read(path).await?;
        Ok(InlineImage {
            bytes_base64_encoded: BASE64.encode(&bytes),
            mime_type: image_mime(path).to_string(),
        })
    }
}

#[async_trait]
impl VideoProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn submit(&self, request: &GenerateRequest) -> ClientResult<RemoteOperation> {
        let parameters = Self::build_parameters(request)?;

        let image = match &request.image {
            Some(path) => Some(Self::load_seed_image(path).await?),
            None => None,
        };

        let body = PredictRequest {
            instances: vec![Instance {
                prompt: request.prompt.clone(),
                image,
            }],
            parameters,
        };

        let url = format!(
            "{}/v1beta/models/{}:predictLongRunning",
            self.base_url, request.model
        );
        info!(model = %request.model, "google: submitting generation");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::from_response(response).await);
        }

        let envelope: OperationEnvelope = response.json().await?;
        let name = envelope
            .name
            .ok_or_else(|| ClientError::invalid_response("No operation name returned"))?;

        debug!(operation = %name, "google: operation accepted");
        Ok(RemoteOperation {
            id: name,
            model: request.model.clone(),
        })
    }

    async fn poll(&self, operation: &RemoteOperation) -> ClientResult<OperationStatus> {
        let url = format!("{}/v1beta/{}", self.base_url, operation.id);

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::from_response(response).await);
        }

        let envelope: OperationEnvelope = response.json().await?;

        if !envelope.done {
            return Ok(OperationStatus::Pending {
                progress_hint: None,
            });
        }

        if let Some(error) = envelope.error {
            return Ok(OperationStatus::Failed {
                message: error
                    .message
                    .unwrap_or_else(|| "Operation failed without a message".to_string()),
            });
        }

        let uri = envelope
            .response
            .as_ref()
            .and_then(extract_video_uri)
            .ok_or_else(|| {
                ClientError::invalid_response("Operation finished but returned no video")
            })?;

        Ok(OperationStatus::Succeeded {
            video: VideoHandle {
                url: uri,
                mime_type: Some("video/mp4".to_string()),
            },
        })
    }

    async fn download(&self, video: &VideoHandle, dest: &Path) -> ClientResult<()> {
        debug!(url = %video.url, dest = %dest.display(), "google: downloading video");

        let response = self
            .client
            .get(&video.url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::from_response(response).await);
        }

        let bytes = response.bytes().await?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }
}

/// Pull the video URI out of a finished operation response.
///
/// The API has shipped both `generateVideoResponse.generatedSamples` and
/// `generatedVideos` shapes; accept either.
fn extract_video_uri(response: &serde_json::Value) -> Option<String> {
    let samples = response
        .pointer("/generateVideoResponse/generatedSamples")
        .or_else(|| response.pointer("/generateVideoResponse/generatedVideos"))
        .or_else(|| response.pointer("/generatedVideos"))?;

    let first = samples.as_array()?.first()?;
    first
        .pointer("/video/uri")
        .or_else(|| first.pointer("/uri"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Apply the per-model person rendering policy, defaulting when unset.
fn resolve_person_generation(
    model: &str,
    mode: &str,
    requested: Option<&str>,
) -> ClientResult<Option<String>> {
    let is_veo2 = model.starts_with("veo-2.0");

    let allowed: &[&str] = if is_veo2 {
        if mode == "text" {
            &["allow_all", "allow_adult", "dont_allow"]
        } else {
            &["allow_adult", "dont_allow"]
        }
    } else if mode == "text" {
        &["allow_all"]
    } else {
        &["allow_adult"]
    };

    let value = match requested {
        Some(value) => value.to_string(),
        // Veo 2 leaves the provider default in place when unspecified
        None if is_veo2 => return Ok(None),
        None => allowed[0].to_string(),
    };

    if !allowed.contains(&value.as_str()) {
        return Err(ClientError::invalid_request(format!(
            "person_generation='{}' not allowed for {} in {} mode. Allowed: {:?}",
            value, model, mode, allowed
        )));
    }
    Ok(Some(value))
}

fn image_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}
