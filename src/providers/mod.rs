pub mod google;
pub mod ollama;

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::config::WingmanConfig;
use crate::core::schemas::LlmRequest;
use crate::error::WingmanError;

use self::google::GoogleProvider;
use self::ollama::OllamaProvider;

/// Characters of a non-JSON error body quoted in provider errors
const ERROR_BODY_CHARS: usize = 500;

/// Characters of an unparseable success body quoted in provider errors
const RESPONSE_EXCERPT_CHARS: usize = 200;

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> anyhow::Result<GenerationResponse>;
    fn name(&self) -> &str;
}

/// Request to an LLM provider
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    pub temperature: f64,
}

/// Response from an LLM provider
#[derive(Debug)]
pub struct GenerationResponse {
    pub content: String,
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub model: String,
}

// ---------- Provider selection ----------

/// The providers Wingman knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local model runner (no credential)
    Ollama,
    /// Hosted Gemini API (requires an API key)
    Google,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Ollama, ProviderKind::Google];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::Google => "google",
        }
    }

    pub fn requires_credential(self) -> bool {
        matches!(self, ProviderKind::Google)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = WingmanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| WingmanError::UnsupportedProvider(s.to_string()))
    }
}

/// A fully resolved provider choice. The Google variant owns its credential,
/// so any value of this type is constructible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSpec {
    Ollama { model: String },
    Google { model: String, api_key: String },
}

impl ProviderSpec {
    /// Resolve a wire-level `llm_request` into a provider choice.
    pub fn resolve(request: &LlmRequest) -> Result<Self, WingmanError> {
        let kind: ProviderKind = request.provider.parse()?;
        let model = request.model.trim().to_string();
        if model.is_empty() {
            return Err(WingmanError::InvalidRequest(format!(
                "llm_request.model must not be empty for provider '{}'",
                kind
            )));
        }

        match kind {
            ProviderKind::Ollama => Ok(ProviderSpec::Ollama { model }),
            ProviderKind::Google => {
                let api_key = request
                    .api_key
                    .as_deref()
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .ok_or(WingmanError::MissingCredential(kind.as_str()))?;
                Ok(ProviderSpec::Google {
                    model,
                    api_key: api_key.to_string(),
                })
            }
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderSpec::Ollama { .. } => ProviderKind::Ollama,
            ProviderSpec::Google { .. } => ProviderKind::Google,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            ProviderSpec::Ollama { model } | ProviderSpec::Google { model, .. } => model,
        }
    }
}

// ---------- Dispatcher ----------

/// Endpoint settings shared by every provider handle.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub ollama_url: String,
    pub google_url: String,
    pub temperature: f64,
}

impl From<&WingmanConfig> for ProviderSettings {
    fn from(config: &WingmanConfig) -> Self {
        Self {
            ollama_url: config.ollama.base_url.clone(),
            google_url: config.google.base_url.clone(),
            temperature: config.model.temperature,
        }
    }
}

/// Builds a fresh chat-model handle per request. Handles are never cached;
/// only the HTTP connection pool is shared.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Client,
    settings: ProviderSettings,
}

impl Dispatcher {
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    pub fn from_config(config: &WingmanConfig) -> Self {
        Self::new(ProviderSettings::from(config))
    }

    /// Resolve `request` and return a handle bound to the chosen provider and model.
    pub fn dispatch(&self, request: &LlmRequest) -> Result<ChatModel, WingmanError> {
        let spec = ProviderSpec::resolve(request)?;
        tracing::debug!(provider = %spec.kind(), model = spec.model(), "dispatching");
        Ok(self.build(spec))
    }

    pub fn build(&self, spec: ProviderSpec) -> ChatModel {
        let temperature = self.settings.temperature;
        match spec {
            ProviderSpec::Ollama { model } => {
                let provider =
                    OllamaProvider::new(self.client.clone(), self.settings.ollama_url.clone());
                ChatModel::new(Box::new(provider), model, temperature)
            }
            ProviderSpec::Google { model, api_key } => {
                let provider = GoogleProvider::new(
                    self.client.clone(),
                    self.settings.google_url.clone(),
                    api_key,
                );
                ChatModel::new(Box::new(provider), model, temperature)
            }
        }
    }
}

/// A provider bound to one model: the callable handle the capabilities use.
pub struct ChatModel {
    provider: Box<dyn LlmProvider>,
    model: String,
    temperature: f64,
}

impl ChatModel {
    pub fn new(provider: Box<dyn LlmProvider>, model: impl Into<String>, temperature: f64) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one completion and return the raw model text.
    pub async fn complete(&self, prompt: &str) -> Result<String, WingmanError> {
        let start = Instant::now();
        let request = GenerationRequest {
            prompt: prompt.to_string(),
            model: self.model.clone(),
            temperature: self.temperature,
        };

        match self.provider.generate(request).await {
            Ok(response) => {
                tracing::debug!(
                    provider = self.provider.name(),
                    model = %response.model,
                    tokens_in = response.tokens_in,
                    tokens_out = response.tokens_out,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "completion finished"
                );
                Ok(response.content)
            }
            Err(e) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    model = %self.model,
                    error = %format!("{:#}", e),
                    "completion failed"
                );
                Err(WingmanError::Provider(e))
            }
        }
    }
}

impl fmt::Debug for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatModel")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm_request(provider: &str, model: &str, api_key: Option<&str>) -> LlmRequest {
        LlmRequest {
            provider: provider.to_string(),
            model: model.to_string(),
            api_key: api_key.map(str::to_string),
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(ProviderSettings {
            ollama_url: "http://localhost:11434".into(),
            google_url: "https://generativelanguage.googleapis.com".into(),
            temperature: 0.7,
        })
    }

    #[test]
    fn test_parse_known_providers() {
        assert_eq!("ollama".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
        assert_eq!("google".parse::<ProviderKind>().unwrap(), ProviderKind::Google);
        assert_eq!(" Google ".parse::<ProviderKind>().unwrap(), ProviderKind::Google);
        assert_eq!("OLLAMA".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
    }

    #[test]
    fn test_unknown_providers_are_unsupported() {
        for name in ["openai", "anthropic", "", "gemini", "ollama2", "goog le"] {
            let err = dispatcher()
                .dispatch(&llm_request(name, "some-model", Some("key")))
                .unwrap_err();
            assert!(
                matches!(err, WingmanError::UnsupportedProvider(ref p) if p == name),
                "Expected unsupported provider for '{}', got: {:?}",
                name,
                err
            );
        }
    }

    #[test]
    fn test_google_without_key_is_missing_credential() {
        for key in [None, Some(""), Some("   ")] {
            let err = dispatcher()
                .dispatch(&llm_request("google", "gemini-2.0-flash", key))
                .unwrap_err();
            assert!(
                matches!(err, WingmanError::MissingCredential("google")),
                "Expected missing credential for key {:?}, got: {:?}",
                key,
                err
            );
        }
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let model = dispatcher()
            .dispatch(&llm_request("ollama", "gemma:7b", None))
            .unwrap();
        assert_eq!(model.provider_name(), "ollama");
        assert_eq!(model.model(), "gemma:7b");
    }

    #[test]
    fn test_google_with_key_dispatches() {
        let model = dispatcher()
            .dispatch(&llm_request("google", "gemini-2.0-flash", Some("secret")))
            .unwrap();
        assert_eq!(model.provider_name(), "google");
        assert_eq!(model.model(), "gemini-2.0-flash");
    }

    #[test]
    fn test_resolve_carries_credential() {
        let spec = ProviderSpec::resolve(&llm_request("google", "gemini", Some(" k1 "))).unwrap();
        assert_eq!(
            spec,
            ProviderSpec::Google {
                model: "gemini".into(),
                api_key: "k1".into()
            }
        );
        assert_eq!(spec.kind(), ProviderKind::Google);
        assert_eq!(spec.model(), "gemini");
    }

    #[test]
    fn test_empty_model_is_invalid() {
        let err = ProviderSpec::resolve(&llm_request("ollama", "  ", None)).unwrap_err();
        assert!(matches!(err, WingmanError::InvalidRequest(_)), "got: {:?}", err);
    }

    #[test]
    fn test_requires_credential() {
        assert!(ProviderKind::Google.requires_credential());
        assert!(!ProviderKind::Ollama.requires_credential());
    }
}
