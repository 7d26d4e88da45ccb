use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use super::{
    ERROR_BODY_CHARS, GenerationRequest, GenerationResponse, LlmProvider, RESPONSE_EXCERPT_CHARS,
};
use crate::error::excerpt;

/// Google Gemini API provider
pub struct GoogleProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoogleProvider {
    pub fn new(client: Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    /// `{base}/v1beta/models/{model}:generateContent`, with the model id
    /// percent-encoded as a single path segment.
    fn generate_url(&self, model: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid Google Gemini base URL '{}'", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Google Gemini base URL '{}' cannot have a path", self.base_url))?
            .pop_if_empty()
            .extend(["v1beta", "models", format!("{}:generateContent", model).as_str()]);
        Ok(url)
    }
}

// ---------- API request/response types ----------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    status: Option<String>,
}

// ---------- LlmProvider implementation ----------

#[async_trait]
impl LlmProvider for GoogleProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let api_request = ApiRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.prompt),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(self.generate_url(&request.model)?)
            .header("x-goog-api-key", &self.api_key)
            .json(&api_request)
            .send()
            .await
            .context("Failed to send request to Google Gemini API")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Google Gemini API response body")?;

        if !status.is_success() {
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&body) {
                match api_error.error.status.as_deref().unwrap_or("UNKNOWN") {
                    "UNAUTHENTICATED" | "PERMISSION_DENIED" => {
                        bail!(
                            "Google Gemini API authentication failed. Check your API key.\n  {}",
                            api_error.error.message
                        );
                    }
                    "RESOURCE_EXHAUSTED" => {
                        bail!(
                            "Google Gemini API quota exhausted. Try again in a moment.\n  {}",
                            api_error.error.message
                        );
                    }
                    "NOT_FOUND" => {
                        bail!(
                            "Google Gemini model '{}' not found.\n  {}",
                            request.model,
                            api_error.error.message
                        );
                    }
                    other => {
                        bail!(
                            "Google Gemini API error ({}): {}",
                            other,
                            api_error.error.message
                        );
                    }
                }
            }

            bail!(
                "Google Gemini API returned HTTP {}: {}",
                status,
                excerpt(&body, ERROR_BODY_CHARS)
            );
        }

        let api_response: ApiResponse = serde_json::from_str(&body).with_context(|| {
            format!(
                "Failed to parse Google Gemini API response: {}",
                excerpt(&body, RESPONSE_EXCERPT_CHARS)
            )
        })?;

        let first = api_response.candidates.first();
        let content: String = first
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if content.trim().is_empty() {
            bail!(
                "Google Gemini API returned empty response (candidates: {}, finish reason: {})",
                api_response.candidates.len(),
                first
                    .and_then(|c| c.finish_reason.as_deref())
                    .unwrap_or("none")
            );
        }

        let (tokens_in, tokens_out) = api_response
            .usage_metadata
            .map(|u| (u.prompt_token_count, u.candidates_token_count))
            .unwrap_or((0, 0));

        Ok(GenerationResponse {
            content,
            tokens_in,
            tokens_out,
            model: api_response.model_version.unwrap_or(request.model),
        })
    }

    fn name(&self) -> &str {
        "google"
    }
}
