use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{
    ERROR_BODY_CHARS, GenerationRequest, GenerationResponse, LlmProvider, RESPONSE_EXCERPT_CHARS,
};
use crate::error::excerpt;

/// Local Ollama model runner
pub struct OllamaProvider {
    client: Client,
    base_url: String,
}

impl OllamaProvider {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

// ---------- API request/response types ----------

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    stream: bool,
    format: &'static str,
    options: ApiOptions,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ApiOptions {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    message: Option<ResponseMessage>,
    #[serde(default)]
    prompt_eval_count: u64,
    #[serde(default)]
    eval_count: u64,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
}

// ---------- LlmProvider implementation ----------

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let api_request = ApiRequest {
            model: request.model.clone(),
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: request.prompt,
            }],
            stream: false,
            format: "json",
            options: ApiOptions {
                temperature: request.temperature,
            },
        };

        let response = self
            .client
            .post(self.chat_url())
            .json(&api_request)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Ollama at {}", self.base_url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Ollama response body")?;

        if !status.is_success() {
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&body) {
                if status == reqwest::StatusCode::NOT_FOUND {
                    bail!(
                        "Ollama model '{}' not found. Pull it first with `ollama pull {}`.\n  {}",
                        request.model,
                        request.model,
                        api_error.error
                    );
                }
                bail!("Ollama error (HTTP {}): {}", status, api_error.error);
            }

            bail!(
                "Ollama returned HTTP {}: {}",
                status,
                excerpt(&body, ERROR_BODY_CHARS)
            );
        }

        let api_response: ApiResponse = serde_json::from_str(&body).with_context(|| {
            format!(
                "Failed to parse Ollama response: {}",
                excerpt(&body, RESPONSE_EXCERPT_CHARS)
            )
        })?;

        let content = api_response
            .message
            .map(|m| m.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            bail!("Ollama returned an empty response for model '{}'", api_response.model);
        }

        Ok(GenerationResponse {
            content,
            tokens_in: api_response.prompt_eval_count,
            tokens_out: api_response.eval_count,
            model: api_response.model,
        })
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_url_trims_trailing_slash() {
        let provider = OllamaProvider::new(Client::new(), "http://localhost:11434/".into());
        assert_eq!(provider.chat_url(), "http://localhost:11434/api/chat");
    }

    #[test]
    fn test_request_body_shape() {
        let body = ApiRequest {
            model: "gemma:7b".into(),
            messages: vec![ApiMessage {
                role: "user".into(),
                content: "hi".into(),
            }],
            stream: false,
            format: "json",
            options: ApiOptions { temperature: 0.7 },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["stream"], false);
        assert_eq!(value["format"], "json");
        assert_eq!(value["options"]["temperature"], 0.7);
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn test_parse_response_without_counts() {
        let body = r#"{"model":"gemma:7b","message":{"role":"assistant","content":"{}"},"done":true}"#;
        let parsed: ApiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.prompt_eval_count, 0);
        assert_eq!(parsed.message.unwrap().content, "{}");
    }
}
