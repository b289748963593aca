//! Daydreams Router video generation adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use veo_models::ModelCatalog;

use crate::error::{ClientError, ClientResult};
use crate::provider::{
    GenerateRequest, OperationStatus, RemoteOperation, VideoHandle, VideoProvider,
};

const DEFAULT_BASE_URL: &str = "https://api-beta.daydreams.systems/v1";

/// Daydreams Router provider.
pub struct DaydreamsProvider {
    api_key: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct JobEnvelope {
    job: Option<Value>,
    #[serde(flatten)]
    rest: Value,
}

#[derive(Debug, Deserialize)]
struct Asset {
    url: Option<String>,
    mime_type: Option<String>,
}

impl DaydreamsProvider {
    pub fn new(api_key: impl Into<String>) -> ClientResult<Self> {
        let base_url = std::env::var("DAYDREAMS_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(api_key, base_url)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> ClientResult<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ClientError::config_error("DAYDREAMS_API_KEY not set"));
        }
        Ok(Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        format!("{}{}", self.base_url, path)
    }

    /// List models exposed by the router.
    pub async fn list_models(&self) -> ClientResult<Value> {
        let response = self
            .client
            .get(self.url("/models"))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::from_response(response).await);
        }
        Ok(response.json().await?)
    }

    fn build_payload(request: &GenerateRequest) -> Value {
        let mut payload = json!({"prompt": request.prompt});

        if let Some(duration) = request.options.duration_seconds {
            payload["duration_seconds"] = json!(duration);
        }
        if let Some(ratio) = &request.options.aspect_ratio {
            payload["aspect_ratio"] = json!(ratio);
        }
        if let Some(resolution) = &request.options.resolution {
            payload["resolution"] = json!(resolution);
        }
        if let Some(audio) = request.options.enable_audio {
            payload["enable_audio"] = json!(audio);
        }

        payload
    }

    async fn post_job(&self, path: &str, body: &Value) -> ClientResult<reqwest::Response> {
        info!(path = %path, "daydreams: submitting job");
        Ok(self
            .client
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?)
    }
}

fn unwrap_job(envelope: JobEnvelope) -> Value {
    envelope.job.unwrap_or(envelope.rest)
}

fn job_field<'a>(job: &'a Value, key: &str) -> Option<&'a str> {
    job.get(key).and_then(|v| v.as_str())
}

fn select_video_asset(job: &Value) -> Option<VideoHandle> {
    let assets: Vec<Asset> = job
        .get("assets")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    assets
        .into_iter()
        .find(|asset| {
            asset
                .mime_type
                .as_deref()
                .map(|m| m.contains("video"))
                .unwrap_or(false)
                || asset
                    .url
                    .as_deref()
                    .map(|u| u.ends_with(".mp4"))
                    .unwrap_or(false)
        })
        .and_then(|asset| {
            asset.url.map(|url| VideoHandle {
                url,
                mime_type: asset.mime_type,
            })
        })
}

#[async_trait]
impl VideoProvider for DaydreamsProvider {
    fn name(&self) -> &'static str {
        "daydreams"
    }

    async fn submit(&self, request: &GenerateRequest) -> ClientResult<RemoteOperation> {
        if request.image.is_some() {
            return Err(ClientError::Unsupported(
                "Daydreams Router does not accept image-seeded generation".to_string(),
            ));
        }

        let router_model = ModelCatalog::daydreams_model(&request.model)
            .map(|m| m.to_string())
            .unwrap_or_else(|| request.model.clone());
        let slug = ModelCatalog::daydreams_slug(&router_model);

        let payload = Self::build_payload(request);

        // Slug-scoped endpoint first; older deployments only expose the
        // model-in-body variant.
        let response = if let Some(slug) = slug {
            let slug_path = format!("/videos/{}/jobs", slug);
            let response = self.post_job(&slug_path, &payload).await?;
            if response.status().as_u16() == 404 {
                warn!(path = %slug_path, "daydreams: slug endpoint missing, falling back");
                let mut with_model = payload.clone();
                with_model["model"] = json!(router_model);
                self.post_job("/videos/jobs", &with_model).await?
            } else {
                response
            }
        } else {
            let mut with_model = payload.clone();
            with_model["model"] = json!(router_model);
            self.post_job("/videos/jobs", &with_model).await?
        };

        if !response.status().is_success() {
            return Err(ClientError::from_response(response).await);
        }

        let job = unwrap_job(response.json().await?);
        let job_id = job_field(&job, "job_id")
            .or_else(|| job_field(&job, "id"))
            .ok_or_else(|| {
                ClientError::invalid_response("Daydreams Router did not return a job identifier")
            })?
            .to_string();

        debug!(job_id = %job_id, "daydreams: job accepted");
        Ok(RemoteOperation {
            id: job_id,
            model: router_model,
        })
    }

    async fn poll(&self, operation: &RemoteOperation) -> ClientResult<OperationStatus> {
        let response = self
            .client
            .get(self.url(&format!("/videos/jobs/{}", operation.id)))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::from_response(response).await);
        }

        let job = unwrap_job(response.json().await?);
        let status = job_field(&job, "status").unwrap_or("queued");

        match status {
            "queued" => Ok(OperationStatus::Pending {
                progress_hint: Some(5),
            }),
            "processing" => Ok(OperationStatus::Pending {
                progress_hint: Some(55),
            }),
            "succeeded" => {
                let video = select_video_asset(&job).ok_or_else(|| {
                    ClientError::invalid_response(
                        "Video generation succeeded but no downloadable asset was returned",
                    )
                })?;
                Ok(OperationStatus::Succeeded { video })
            }
            "cancelled" => Ok(OperationStatus::Failed {
                message: "Job was cancelled by the router".to_string(),
            }),
            other => {
                let message = job_field(&job, "error")
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| {
                        format!("Video generation failed with status '{}'", other)
                    });
                Ok(OperationStatus::Failed { message })
            }
        }
    }

    async fn download(&self, video: &VideoHandle, dest: &Path) -> ClientResult<()> {
        debug!(url = %video.url, dest = %dest.display(), "daydreams: downloading asset");

        let mut response = self
            .client
            .get(self.url(&video.url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::from_response(response).await);
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(dest).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base: &str) -> DaydreamsProvider {
        DaydreamsProvider::with_base_url("dd-key", base).unwrap()
    }

    #[test]
    fn test_asset_selection() {
        let job = json!({
            "assets": [
                {"url": "https://cdn/thumb.jpg", "mime_type": "image/jpeg"},
                {"url": "https://cdn/clip.mp4", "mime_type": "video/mp4"}
            ]
        });
        let video = select_video_asset(&job).unwrap();
        assert_eq!(video.url, "https://cdn/clip.mp4");

        // URL suffix is enough when mime types are missing
        let bare = json!({"assets": [{"url": "https://cdn/final.mp4"}]});
        assert!(select_video_asset(&bare).is_some());

        assert!(select_video_asset(&json!({"assets": []})).is_none());
    }

    #[tokio::test]
    async fn test_image_seed_rejected() {
        let provider = provider("http://localhost:9");
        let request = GenerateRequest::new("p", "veo-3.0-fast-generate-preview")
            .with_image("/tmp/seed.jpg");
        let err = provider.submit(&request).await.unwrap_err();
        assert!(matches!(err, ClientError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_submit_slug_fallback() {
        let server = MockServer::start().await;

        // Slug route missing on this deployment
        Mock::given(method("POST"))
            .and(path("/videos/veo-3-fast/jobs"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/videos/jobs"))
            .and(header("authorization", "Bearer dd-key"))
            .and(body_partial_json(
                json!({"prompt": "p", "model": "google/veo-3-fast"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "job": {"id": "job-9", "status": "queued"}
            })))
            .mount(&server)
            .await;

        let provider = provider(&server.uri());
        let operation = provider
            .submit(&GenerateRequest::new("p", "veo-3.0-fast-generate-preview"))
            .await
            .unwrap();
        assert_eq!(operation.id, "job-9");
    }

    #[tokio::test]
    async fn test_poll_statuses() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/videos/jobs/run"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "job": {"id": "run", "status": "processing"}
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/videos/jobs/done"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "job": {
                    "id": "done",
                    "status": "succeeded",
                    "assets": [{"url": "https://cdn/out.mp4", "mime_type": "video/mp4"}]
                }
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/videos/jobs/bad"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "bad", "status": "failed", "error": "quota exceeded"
            })))
            .mount(&server)
            .await;

        let provider = provider(&server.uri());
        let model = "google/veo-3.0-fast-generate-preview".to_string();
        let op = |id: &str| RemoteOperation {
            id: id.to_string(),
            model: model.clone(),
        };

        assert!(matches!(
            provider.poll(&op("run")).await.unwrap(),
            OperationStatus::Pending {
                progress_hint: Some(55)
            }
        ));

        match provider.poll(&op("done")).await.unwrap() {
            OperationStatus::Succeeded { video } => assert_eq!(video.url, "https://cdn/out.mp4"),
            other => panic!("unexpected status: {:?}", other),
        }

        match provider.poll(&op("bad")).await.unwrap() {
            OperationStatus::Failed { message } => assert_eq!(message, "quota exceeded"),
            other => panic!("unexpected status: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_download_relative_url() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/assets/out.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"video-bytes".to_vec()))
            .mount(&server)
            .await;

        let provider = provider(&server.uri());
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("out.mp4");

        provider
            .download(
                &VideoHandle {
                    url: "/assets/out.mp4".to_string(),
                    mime_type: Some("video/mp4".to_string()),
                },
                &dest,
            )
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"video-bytes");
    }
}
