use std::time::Instant;

use crate::core::config::WingmanConfig;
use crate::core::diff;
use crate::core::parser;
use crate::core::prompt;
use crate::core::schemas::{
    CodeWalkthroughRequest, CodeWalkthroughResponse, ExplainErrorsRequest, ExplainErrorsResponse,
    GenerateTestCasesRequest, GenerateTestCasesResponse, LlmRequest, SuggestFixesRequest,
    SuggestFixesResponse,
};
use crate::error::WingmanError;
use crate::providers::{ChatModel, Dispatcher};

// ---------- Assistant ----------

/// Runs the four capabilities: dispatch a provider, assemble the prompt,
/// complete, parse.
#[derive(Debug, Clone)]
pub struct Assistant {
    dispatcher: Dispatcher,
    default_llm: LlmRequest,
}

impl Assistant {
    pub fn new(dispatcher: Dispatcher, default_llm: LlmRequest) -> Self {
        Self {
            dispatcher,
            default_llm,
        }
    }

    pub fn from_config(config: &WingmanConfig) -> Self {
        Self::new(
            Dispatcher::from_config(config),
            config.default_llm_request(),
        )
    }

    fn model_for(&self, llm_request: Option<&LlmRequest>) -> Result<ChatModel, WingmanError> {
        self.dispatcher
            .dispatch(llm_request.unwrap_or(&self.default_llm))
    }

    pub async fn explain_errors(
        &self,
        req: &ExplainErrorsRequest,
    ) -> Result<ExplainErrorsResponse, WingmanError> {
        let model = self.model_for(req.llm_request.as_ref())?;
        explain_errors(&model, req).await
    }

    pub async fn suggest_fixes(
        &self,
        req: &SuggestFixesRequest,
    ) -> Result<SuggestFixesResponse, WingmanError> {
        let model = self.model_for(req.llm_request.as_ref())?;
        suggest_fixes(&model, req).await
    }

    pub async fn generate_testcases(
        &self,
        req: &GenerateTestCasesRequest,
    ) -> Result<GenerateTestCasesResponse, WingmanError> {
        validate_testcase_count(req)?;
        let model = self.model_for(req.llm_request.as_ref())?;
        generate_testcases(&model, req).await
    }

    pub async fn code_walkthrough(
        &self,
        req: &CodeWalkthroughRequest,
    ) -> Result<CodeWalkthroughResponse, WingmanError> {
        let model = self.model_for(req.llm_request.as_ref())?;
        code_walkthrough(&model, req).await
    }
}

// ---------- Capabilities over an already-dispatched model ----------

async fn run(
    model: &ChatModel,
    capability: &'static str,
    prompt: String,
) -> Result<String, WingmanError> {
    let start = Instant::now();
    tracing::info!(
        capability,
        provider = model.provider_name(),
        model = model.model(),
        prompt_chars = prompt.len(),
        "calling model"
    );
    let content = model.complete(&prompt).await?;
    tracing::debug!(
        capability,
        duration_ms = start.elapsed().as_millis() as u64,
        "model responded"
    );
    Ok(content)
}

fn validate_testcase_count(req: &GenerateTestCasesRequest) -> Result<(), WingmanError> {
    if req.num_testcases == 0 {
        return Err(WingmanError::InvalidRequest(
            "num_testcases must be at least 1".to_string(),
        ));
    }
    Ok(())
}

pub async fn explain_errors(
    model: &ChatModel,
    req: &ExplainErrorsRequest,
) -> Result<ExplainErrorsResponse, WingmanError> {
    let content = run(model, "explain-errors", prompt::explain_errors(req)).await?;
    parser::parse_explanation(&content)
}

/// Ask for fixed code, then diff it against the submitted code.
pub async fn suggest_fixes(
    model: &ChatModel,
    req: &SuggestFixesRequest,
) -> Result<SuggestFixesResponse, WingmanError> {
    let content = run(model, "suggest-fixes", prompt::suggest_fixes(req)).await?;
    let fix = parser::parse_fix(&content)?;
    let differences = diff::unified_diff(&req.code, &fix.fixed_code);

    Ok(SuggestFixesResponse {
        fixed_code: fix.fixed_code,
        fixes: fix.fixes,
        differences,
    })
}

pub async fn generate_testcases(
    model: &ChatModel,
    req: &GenerateTestCasesRequest,
) -> Result<GenerateTestCasesResponse, WingmanError> {
    validate_testcase_count(req)?;
    let content = run(model, "generate-testcases", prompt::generate_testcases(req)).await?;
    parser::parse_testcases(&content, req.num_testcases as usize)
}

pub async fn code_walkthrough(
    model: &ChatModel,
    req: &CodeWalkthroughRequest,
) -> Result<CodeWalkthroughResponse, WingmanError> {
    let content = run(model, "code-walkthrough", prompt::code_walkthrough(req)).await?;
    parser::parse_walkthrough(&content)
}

// ---------- Tests ----------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::providers::{GenerationRequest, GenerationResponse, LlmProvider, ProviderSettings};

    /// Returns a canned completion and records the prompts it saw.
    struct CannedProvider {
        reply: String,
        seen: Arc<Mutex<Vec<GenerationRequest>>>,
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        async fn generate(&self, request: GenerationRequest) -> anyhow::Result<GenerationResponse> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(GenerationResponse {
                content: self.reply.clone(),
                tokens_in: 10,
                tokens_out: 5,
                model: request.model,
            })
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn canned(reply: &str) -> (ChatModel, Arc<Mutex<Vec<GenerationRequest>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let provider = CannedProvider {
            reply: reply.to_string(),
            seen: seen.clone(),
        };
        (ChatModel::new(Box::new(provider), "canned-model", 0.7), seen)
    }

    #[tokio::test]
    async fn test_suggest_fixes_attaches_diff() {
        let (model, seen) = canned(
            r#"{"fixed_code": "x = 0\nprint(1/x if x else 0)", "fixes": ["Guard the division"]}"#,
        );
        let req = SuggestFixesRequest {
            code: "print(1/0)".into(),
            error_message: "ZeroDivisionError".into(),
            user_request: String::new(),
            language: "python".into(),
            llm_request: None,
        };

        let resp = suggest_fixes(&model, &req).await.unwrap();
        assert_eq!(resp.fixes, vec!["Guard the division"]);
        assert_eq!(resp.differences[0], "--- original");
        assert!(resp.differences.contains(&"-print(1/0)".to_string()));
        assert!(resp.differences.contains(&"+x = 0".to_string()));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "canned-model");
        assert_eq!(seen[0].temperature, 0.7);
        assert!(seen[0].prompt.contains("ZeroDivisionError"));
    }

    #[tokio::test]
    async fn test_unchanged_fix_has_no_differences() {
        let (model, _) = canned(r#"{"fixed_code": "print(1)", "fixes": []}"#);
        let req = SuggestFixesRequest {
            code: "print(1)\n".into(),
            error_message: String::new(),
            user_request: String::new(),
            language: "python".into(),
            llm_request: None,
        };
        let resp = suggest_fixes(&model, &req).await.unwrap();
        assert!(resp.differences.is_empty());
    }

    #[tokio::test]
    async fn test_zero_testcases_rejected_before_calling_model() {
        let (model, seen) = canned("{}");
        let req = GenerateTestCasesRequest {
            code: "def f(): pass".into(),
            code_explanation: None,
            num_testcases: 0,
            language: "python".into(),
            llm_request: None,
        };
        let err = generate_testcases(&model, &req).await.unwrap_err();
        assert!(matches!(err, WingmanError::InvalidRequest(_)), "got: {:?}", err);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_assistant_uses_default_llm_when_absent() {
        let assistant = Assistant::new(
            Dispatcher::new(ProviderSettings {
                ollama_url: "http://127.0.0.1:9".into(),
                google_url: "http://127.0.0.1:9".into(),
                temperature: 0.7,
            }),
            LlmRequest {
                provider: "google".into(),
                model: "gemini".into(),
                api_key: None,
            },
        );
        let req = CodeWalkthroughRequest {
            code: "x = 1".into(),
            focus_on: None,
            language: "python".into(),
            llm_request: None,
        };
        // Default is google without a key, so dispatch fails before any network call
        let err = assistant.code_walkthrough(&req).await.unwrap_err();
        assert!(matches!(err, WingmanError::MissingCredential("google")), "got: {:?}", err);
    }

    #[tokio::test]
    async fn test_assistant_rejects_unknown_provider() {
        let assistant = Assistant::from_config(&WingmanConfig::default());
        let req = ExplainErrorsRequest {
            code: "print(1/0)".into(),
            error_message: "boom".into(),
            language: "python".into(),
            llm_request: Some(LlmRequest {
                provider: "openai".into(),
                model: "gpt-4".into(),
                api_key: Some("k".into()),
            }),
        };
        let err = assistant.explain_errors(&req).await.unwrap_err();
        assert!(matches!(err, WingmanError::UnsupportedProvider(ref p) if p == "openai"));
    }
}
