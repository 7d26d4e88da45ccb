use thiserror::Error;

/// Errors surfaced by the capability pipeline.
///
/// None of these are retried; the server maps each variant to an HTTP status
/// and the CLI prints it.
#[derive(Debug, Error)]
pub enum WingmanError {
    #[error("LLM provider '{0}' is not supported. Must be one of: ollama, google")]
    UnsupportedProvider(String),

    #[error("LLM provider '{0}' requires an API key but none was supplied")]
    MissingCredential(&'static str),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Model output for {capability} is not valid: {reason}")]
    MalformedOutput {
        capability: &'static str,
        reason: String,
    },

    #[error("LLM provider call failed: {0:#}")]
    Provider(anyhow::Error),
}

impl WingmanError {
    /// Stable machine-readable name, used as the `error` field of HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            WingmanError::UnsupportedProvider(_) => "unsupported_provider",
            WingmanError::MissingCredential(_) => "missing_credential",
            WingmanError::InvalidRequest(_) => "invalid_request",
            WingmanError::MalformedOutput { .. } => "malformed_model_output",
            WingmanError::Provider(_) => "provider_error",
        }
    }

    pub(crate) fn malformed(capability: &'static str, reason: impl Into<String>) -> Self {
        WingmanError::MalformedOutput {
            capability,
            reason: reason.into(),
        }
    }
}

/// At most `max_chars` characters of `text` for an error message, cut on a
/// character boundary and marked with `...` when shortened.
pub(crate) fn excerpt(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
