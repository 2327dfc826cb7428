//! Google Generative AI (Gemini) client
//!
//! Minimal `generateContent` client: one user turn in, first candidate
//! text out. Rate-limit responses map to [`PilotError::RateLimited`] so
//! the gateway can classify them without string-matching here.

use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::LlmSettings;
use crate::error::{PilotError, Result};
use crate::llm::InferenceService;

pub struct GeminiClient {
    settings: LlmSettings,
    api_key: String,
    http_client: HttpClient,
}

impl GeminiClient {
    pub fn new(settings: LlmSettings) -> Result<Self> {
        let api_key = settings.resolve_api_key()?;
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("screenpilot/0.2")
            .build()?;

        Ok(Self {
            settings,
            api_key,
            http_client,
        })
    }

    fn request_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model,
            self.api_key
        )
    }
}

#[async_trait::async_trait]
impl InferenceService for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: Some(GeminiGenerationConfig {
                temperature: Some(self.settings.temperature),
            }),
        };

        let response = self
            .http_client
            .post(self.request_url())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                let text = response.text().await?;
                let parsed: GeminiResponse = serde_json::from_str(&text).map_err(|e| {
                    crate::error_log!("unparseable Gemini body: {}", e);
                    PilotError::Json(e.to_string())
                })?;

                parsed
                    .candidates
                    .into_iter()
                    .next()
                    .and_then(|c| c.content.parts.into_iter().next())
                    .map(|p| p.text)
                    .filter(|t| !t.is_empty())
                    .ok_or(PilotError::EmptyResponse)
            }
            StatusCode::TOO_MANY_REQUESTS => Err(PilotError::RateLimited {
                message: read_error_message(response).await,
            }),
            status => Err(PilotError::Provider {
                status: status.as_u16(),
                message: read_error_message(response).await,
            }),
        }
    }
}

async fn read_error_message(response: reqwest::Response) -> String {
    let body: Option<serde_json::Value> = response.json().await.ok();
    body.as_ref()
        .and_then(|v| v.get("error").and_then(|e| e.get("message")))
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown error")
        .to_string()
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}
