use std::path::Path;

use anyhow::{Context, Result, bail};
use reqwest::Url;
use serde::Deserialize;

use crate::core::schemas::LlmRequest;
use crate::providers::ProviderKind;

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "wingman.toml";

/// Service configuration from wingman.toml. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WingmanConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub ollama: OllamaConfig,
    pub google: GoogleConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// The model used when a request body carries no `llm_request`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub provider: String,
    pub model: String,
    pub temperature: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "gemma:7b".to_string(),
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub base_url: String,
    /// Environment variable holding the Gemini API key
    pub key_env: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            key_env: "GOOGLE_API_KEY".to_string(),
        }
    }
}

impl WingmanConfig {
    /// Load and validate configuration from a wingman.toml file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: WingmanConfig =
            toml::from_str(content).context("Failed to parse wingman.toml")?;

        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else `./wingman.toml` if it exists, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            tracing::debug!(path = %local.display(), "loading config");
            return Self::from_file(local);
        }

        Ok(Self::default())
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        // Provider must name a supported backend
        if let Err(e) = self.model.provider.parse::<ProviderKind>() {
            bail!("Invalid model provider in wingman.toml: {}", e);
        }

        if self.model.model.trim().is_empty() {
            bail!("Invalid model in wingman.toml: model name must not be empty");
        }

        // Validate temperature range
        if !(0.0..=2.0).contains(&self.model.temperature) {
            bail!(
                "Invalid temperature {} in wingman.toml. Must be between 0.0 and 2.0",
                self.model.temperature
            );
        }

        if self.server.port == 0 {
            bail!("Invalid server port 0 in wingman.toml");
        }

        validate_base_url("ollama.base_url", &self.ollama.base_url)?;
        validate_base_url("google.base_url", &self.google.base_url)?;

        Ok(())
    }

    /// Resolve the Gemini API key from the environment variable named in config.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.google.key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// The `llm_request` applied when a request body leaves it out.
    ///
    /// The API key is read once here and handed to the provider explicitly.
    pub fn default_llm_request(&self) -> LlmRequest {
        let needs_key = self
            .model
            .provider
            .parse::<ProviderKind>()
            .map(ProviderKind::requires_credential)
            .unwrap_or(false);

        LlmRequest {
            provider: self.model.provider.clone(),
            model: self.model.model.clone(),
            api_key: if needs_key { self.resolve_api_key() } else { None },
        }
    }

    /// Socket address string for the HTTP server
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn validate_base_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .with_context(|| format!("Invalid {} '{}' in wingman.toml", field, value))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!(
            "Invalid {} '{}' in wingman.toml. Must be an http(s) URL",
            field,
            value
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 9000

[model]
provider = "google"
model = "gemini-2.0-flash"
temperature = 0.2

[ollama]
base_url = "http://ollama.internal:11434"

[google]
key_env = "WINGMAN_TEST_GEMINI_KEY"
"#;

    #[test]
    fn test_parse_valid_config() {
        let config = WingmanConfig::from_str(VALID_CONFIG).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.model.provider, "google");
        assert_eq!(config.model.model, "gemini-2.0-flash");
        assert_eq!(config.model.temperature, 0.2);
        assert_eq!(config.ollama.base_url, "http://ollama.internal:11434");
        // Unset keys in a present section keep their defaults
        assert_eq!(
            config.google.base_url,
            "https://generativelanguage.googleapis.com"
        );
        assert_eq!(config.google.key_env, "WINGMAN_TEST_GEMINI_KEY");
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = WingmanConfig::from_str("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.model.provider, "ollama");
        assert_eq!(config.model.model, "gemma:7b");
        assert_eq!(config.model.temperature, 0.7);
        assert_eq!(config.bind_address(), "127.0.0.1:8000");
    }

    #[test]
    fn test_invalid_provider() {
        let err = WingmanConfig::from_str("[model]\nprovider = \"openai\"\n").unwrap_err();
        assert!(
            err.to_string().contains("Invalid model provider"),
            "Expected provider error, got: {}",
            err
        );
    }

    #[test]
    fn test_invalid_temperature() {
        let err = WingmanConfig::from_str("[model]\ntemperature = 3.0\n").unwrap_err();
        assert!(
            err.to_string().contains("Invalid temperature"),
            "Expected temperature error, got: {}",
            err
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = WingmanConfig::from_str("[ollama]\nbase_url = \"localhost\"\n").unwrap_err();
        assert!(
            err.to_string().contains("ollama.base_url"),
            "Expected base url error, got: {}",
            err
        );

        let err =
            WingmanConfig::from_str("[google]\nbase_url = \"ftp://example.com\"\n").unwrap_err();
        assert!(err.to_string().contains("http(s)"), "got: {}", err);
    }

    #[test]
    fn test_zero_port() {
        let err = WingmanConfig::from_str("[server]\nport = 0\n").unwrap_err();
        assert!(err.to_string().contains("port"), "got: {}", err);
    }

    #[test]
    fn test_malformed_toml() {
        let err = WingmanConfig::from_str("[server\nport = ").unwrap_err();
        assert!(
            err.to_string().contains("Failed to parse"),
            "Expected parse error, got: {}",
            err
        );
    }

    #[test]
    fn test_from_file_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wingman.toml");
        std::fs::write(&path, "[server]\nport = 8123\n").unwrap();

        let config = WingmanConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 8123);

        let missing = dir.path().join("missing.toml");
        let err = WingmanConfig::load(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"), "got: {}", err);
    }

    #[test]
    fn test_default_llm_request_reads_key_for_google() {
        let config = WingmanConfig::from_str(VALID_CONFIG).unwrap();
        unsafe { std::env::set_var("WINGMAN_TEST_GEMINI_KEY", "test-key-123") };
        let req = config.default_llm_request();
        unsafe { std::env::remove_var("WINGMAN_TEST_GEMINI_KEY") };

        assert_eq!(req.provider, "google");
        assert_eq!(req.model, "gemini-2.0-flash");
        assert_eq!(req.api_key.as_deref(), Some("test-key-123"));
    }

    #[test]
    fn test_default_llm_request_ollama_has_no_key() {
        let config = WingmanConfig::default();
        let req = config.default_llm_request();
        assert_eq!(req.provider, "ollama");
        assert!(req.api_key.is_none());
    }
}
