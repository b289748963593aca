//! Gemini scene-planner client.
//!
//! Turns a one-line idea into a structured `ScenePlan` by asking Gemini for
//! JSON constrained to the plan schema.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use veo_models::ScenePlan;

use crate::error::{ClientError, ClientResult};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const FALLBACK_MODELS: &[&str] = &[
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
];

const BASE_GUIDANCE: &str = r#"You are a cinematic video prompt writer for Google Veo. Veo can transform text or images into rich, character-driven video scenes.

Generate exactly {number_of_scenes} concise scene prompts capturing an approximately eight second moment each. Every prompt must describe the action, setting, mood, wardrobe, cinematography, and audio cues clearly enough for Veo to render without additional context.

Core Inputs:
- Idea: {idea}
{optional_inputs}

Additional Guidance:
- Maintain character and location continuity across clips unless explicitly told otherwise.
- Use vivid, specific language that balances story beats with production detail.
- If dialogue is needed, format it as `[tone]: "spoken words"`.
- Vary shot types and movement so the finished sequence feels dynamic.
- Ensure each prompt is self-contained and references no external material.
{custom_guidance}

Return a valid JSON object that matches the supplied schema exactly.
"#;

/// Inputs for a scene-plan request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    /// The core idea to expand into scenes
    pub idea: String,
    /// How many clips to plan
    pub clip_count: usize,
    /// Optional character description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_description: Option<String>,
    /// Optional target style, e.g. "music video"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_type: Option<String>,
    /// Optional look/feel notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_characteristics: Option<String>,
    /// Optional primary camera perspective
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_angle: Option<String>,
    /// Free-form extra instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

impl PlanRequest {
    pub fn new(idea: impl Into<String>, clip_count: usize) -> Self {
        Self {
            idea: idea.into(),
            clip_count,
            character_description: None,
            video_type: None,
            video_characteristics: None,
            camera_angle: None,
            additional_context: None,
        }
    }
}

/// Gemini structured-output client.
pub struct PlannerClient {
    api_key: String,
    base_url: String,
    client: Client,
    models: Vec<String>,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

impl PlannerClient {
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
            models: FALLBACK_MODELS.iter().map(|m| m.to_string()).collect(),
        })
    }

    /// Override the model fallback order.
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        if !models.is_empty() {
            self.models = models;
        }
        self
    }

    /// Generate a structured scene plan, trying models in order.
    pub async fn plan_scenes(&self, request: &PlanRequest) -> ClientResult<ScenePlan> {
        if request.idea.trim().is_empty() {
            return Err(ClientError::invalid_request("Plan idea must not be empty"));
        }
        if request.clip_count == 0 {
            return Err(ClientError::invalid_request(
                "Plan must request at least one clip",
            ));
        }

        let prompt = build_prompt(request);
        let schema = plan_schema();

        let mut last_error = None;
        for model in &self.models {
            info!(model = %model, "planner: requesting scene plan");
            match self.call_model(model, &prompt, &schema).await {
                Ok(plan) => return Ok(plan),
                Err(e) => {
                    warn!(model = %model, "planner: model failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ClientError::operation_failed("All planner models failed")))
    }

    async fn call_model(
        &self,
        model: &str,
        prompt: &str,
        schema: &Value,
    ) -> ClientResult<ScenePlan> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: Some(schema.clone()),
            },
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(ClientError::from_response(response).await);
        }

        let body: GeminiResponse = response.json().await?;
        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| ClientError::invalid_response("No content in planner response"))?;

        let json = strip_code_fences(text);
        if json.is_empty() {
            return Err(ClientError::invalid_response("Planner returned empty text"));
        }

        Ok(serde_json::from_str(json)?)
    }
}

/// Schema shipped to Gemini so the response parses directly into `ScenePlan`.
fn plan_schema() -> Value {
    let schema = schemars::schema_for!(ScenePlan);
    serde_json::to_value(schema.schema).unwrap_or(Value::Null)
}

fn build_prompt(request: &PlanRequest) -> String {
    let mut input_lines: Vec<String> = Vec::new();
    let mut guidance_lines: Vec<String> = Vec::new();

    if let Some(desc) = &request.character_description {
        input_lines.push(format!("- Character Description: {}", desc.trim()));
    }
    if let Some(video_type) = &request.video_type {
        input_lines.push(format!("- Video Type: {}", video_type.trim()));
    }
    if let Some(style) = &request.video_characteristics {
        input_lines.push(format!("- Target Style: {}", style.trim()));
    }
    if let Some(angle) = &request.camera_angle {
        input_lines.push(format!("- Primary Camera Perspective: {}", angle.trim()));
        guidance_lines.push(format!(
            "- When describing coverage, respect the primary perspective {} while still varying shot sizes.",
            angle.trim()
        ));
    }
    if let Some(context) = &request.additional_context {
        guidance_lines.push(format!("- Additional instructions: {}", context.trim()));
    }

    let optional_inputs = if input_lines.is_empty() {
        "- (no additional structured inputs provided)".to_string()
    } else {
        input_lines.join("\n")
    };
    let custom_guidance = if guidance_lines.is_empty() {
        String::new()
    } else {
        format!("\n{}", guidance_lines.join("\n"))
    };

    BASE_GUIDANCE
        .replace("{number_of_scenes}", &request.clip_count.to_string())
        .replace("{idea}", &request.idea)
        .replace("{optional_inputs}", &optional_inputs)
        .replace("{custom_guidance}", &custom_guidance)
}

/// Drop markdown code fences some models wrap around JSON output.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    let text = text.strip_prefix("```").unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn minimal_plan_json() -> Value {
        json!({
            "characters": [],
            "clips": [{
                "id": "clip-1",
                "shot": {"composition": "wide", "camera": "35mm"},
                "subject": {"description": "a fox", "wardrobe": "none"},
                "scene": {"location": "forest", "environment": "misty pines"},
                "visual_details": {"action": "running"},
                "cinematography": {"lighting": "dawn", "tone": "hopeful", "color_grade": "warm"},
                "audio_track": {},
                "dialogue": {"character": "narrator", "line": "go"},
                "performance": {},
                "duration_sec": 8
            }]
        })
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_prompt_assembly() {
        let mut request = PlanRequest::new("a fox's journey", 3);
        request.camera_angle = Some("low angle".to_string());

        let prompt = build_prompt(&request);
        assert!(prompt.contains("Generate exactly 3 concise scene prompts"));
        assert!(prompt.contains("- Idea: a fox's journey"));
        assert!(prompt.contains("- Primary Camera Perspective: low angle"));
        assert!(prompt.contains("respect the primary perspective low angle"));

        // No structured inputs yields the placeholder line
        let bare = build_prompt(&PlanRequest::new("idea", 4));
        assert!(bare.contains("(no additional structured inputs provided)"));
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let client = PlannerClient::with_base_url("k", "http://localhost:9").unwrap();
        let rt = tokio::runtime::Runtime::new().unwrap();

        let err = rt
            .block_on(client.plan_scenes(&PlanRequest::new("  ", 4)))
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));

        let err = rt
            .block_on(client.plan_scenes(&PlanRequest::new("idea", 0)))
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_plan_scenes_with_fallback() {
        let server = MockServer::start().await;

        // First model errors, second returns a fenced plan
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-pro:generateContent"))
            .and(query_param("key", "k"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fenced = format!("```json\n{}\n```", minimal_plan_json());
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": fenced}]}}]
            })))
            .mount(&server)
            .await;

        let client = PlannerClient::with_base_url("k", server.uri()).unwrap();
        let plan = client
            .plan_scenes(&PlanRequest::new("a fox's journey", 1))
            .await
            .unwrap();

        assert_eq!(plan.clips.len(), 1);
        assert_eq!(plan.clips[0].id, "clip-1");
        assert_eq!(plan.clips[0].duration_sec, 8);
        // Schema defaults fill unspecified fields
        assert_eq!(plan.clips[0].aspect_ratio, "16:9");
    }
}
