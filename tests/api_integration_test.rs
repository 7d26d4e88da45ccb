//! Real model integration test.
//!
//! Talks to a locally running Ollama and checks every capability end to end.
//! It is ignored by default. Run it with:
//!
//!     cargo test -- --ignored
//!
//! Requires: WINGMAN_OLLAMA_MODEL set to a model already pulled into the local
//! Ollama (e.g. `gemma:7b`). WINGMAN_OLLAMA_URL overrides http://localhost:11434.

use wingman::core::assistant::Assistant;
use wingman::core::config::WingmanConfig;
use wingman::core::diff::apply_unified_diff;
use wingman::core::schemas::{
    CodeWalkthroughRequest, ExplainErrorsRequest, GenerateTestCasesRequest, LlmRequest,
    SuggestFixesRequest,
};

fn local_ollama() -> Option<(Assistant, LlmRequest)> {
    let model = std::env::var("WINGMAN_OLLAMA_MODEL").ok()?;
    let url = std::env::var("WINGMAN_OLLAMA_URL")
        .unwrap_or_else(|_| "http://localhost:11434".to_string());

    let config = WingmanConfig::from_str(&format!(
        "[model]\nprovider = \"ollama\"\nmodel = \"{}\"\n\n[ollama]\nbase_url = \"{}\"\n",
        model, url
    ))
    .expect("test config should be valid");

    let llm = LlmRequest {
        provider: "ollama".into(),
        model,
        api_key: None,
    };
    Some((Assistant::from_config(&config), llm))
}

#[tokio::test]
#[ignore]
async fn test_real_ollama_all_capabilities() {
    let Some((assistant, llm)) = local_ollama() else {
        eprintln!("Skipping: WINGMAN_OLLAMA_MODEL not set");
        return;
    };

    // --- Explain ---
    let explained = assistant
        .explain_errors(&ExplainErrorsRequest {
            code: "print(1/0)".into(),
            error_message: "ZeroDivisionError: division by zero".into(),
            language: "python".into(),
            llm_request: Some(llm.clone()),
        })
        .await
        .expect("explain-errors should succeed");
    assert!(!explained.explanation.trim().is_empty());
    println!("Explanation: {}", explained.explanation);

    // --- Fix ---
    let code = "print(1/0)";
    let fixed = assistant
        .suggest_fixes(&SuggestFixesRequest {
            code: code.into(),
            error_message: "ZeroDivisionError: division by zero".into(),
            user_request: String::new(),
            language: "python".into(),
            llm_request: Some(llm.clone()),
        })
        .await
        .expect("suggest-fixes should succeed");
    assert!(!fixed.fixed_code.trim().is_empty());
    let applied = apply_unified_diff(code, &fixed.differences).expect("diff should apply");
    assert_eq!(applied.trim_end(), fixed.fixed_code.trim_end());
    println!("Fixed code:\n{}", fixed.fixed_code);

    // --- Test cases ---
    let cases = assistant
        .generate_testcases(&GenerateTestCasesRequest {
            code: "def func(a: int, b: int):\n    return a + b".into(),
            code_explanation: Some("Addition of two numbers.".into()),
            num_testcases: 2,
            language: "python".into(),
            llm_request: Some(llm.clone()),
        })
        .await
        .expect("generate-testcases should succeed");
    assert_eq!(cases.testcases.len(), 2);

    // --- Walkthrough ---
    let walk = assistant
        .code_walkthrough(&CodeWalkthroughRequest {
            code: "def print_fibonacci(n):\n    a, b = 0, 1\n    for _ in range(n):\n        print(a)\n        a, b = b, a + b".into(),
            focus_on: None,
            language: "python".into(),
            llm_request: Some(llm),
        })
        .await
        .expect("code-walkthrough should succeed");
    assert!(!walk.walkthrough.is_empty());
}
