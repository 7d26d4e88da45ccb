//! Request and response bodies for the four capabilities.
//!
//! These are the JSON shapes exchanged with the editor extension. Every request
//! may carry an `llm_request`; when it is absent the server falls back to the
//! default model from `wingman.toml`.

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

fn default_language() -> String {
    "python".to_string()
}

/// Which provider and model to run a capability against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmRequest {
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

// ---------- 1. Explain errors ----------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainErrorsRequest {
    pub code: String,
    pub error_message: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub llm_request: Option<LlmRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainErrorsResponse {
    pub explanation: String,
    #[serde(default)]
    pub possible_causes: Vec<String>,
}

// ---------- 2. Suggest fixes ----------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestFixesRequest {
    pub code: String,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub user_request: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub llm_request: Option<LlmRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestFixesResponse {
    pub fixed_code: String,
    #[serde(default)]
    pub fixes: Vec<String>,
    /// Unified diff of `code` → `fixed_code`, one entry per line
    #[serde(default)]
    pub differences: Vec<String>,
}

// ---------- 3. Generate test cases ----------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateTestCasesRequest {
    pub code: String,
    #[serde(default)]
    pub code_explanation: Option<String>,
    /// The editor extension sends this as a string ("1".."5"); plain integers are accepted too.
    #[serde(deserialize_with = "deserialize_count")]
    pub num_testcases: u32,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub llm_request: Option<LlmRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: BTreeMap<String, String>,
    pub expected_output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateTestCasesResponse {
    pub testcases: Vec<TestCase>,
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u32),
        Text(String),
    }

    match Count::deserialize(deserializer)? {
        Count::Number(n) => Ok(n),
        Count::Text(s) => s.trim().parse().map_err(|_| {
            de::Error::custom(format!(
                "num_testcases must be a non-negative integer, got '{}'",
                s
            ))
        }),
    }
}

// ---------- 4. Code walkthrough ----------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeWalkthroughRequest {
    pub code: String,
    #[serde(default)]
    pub focus_on: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub llm_request: Option<LlmRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSegmentExplanation {
    pub segment: String,
    pub step: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeWalkthroughResponse {
    pub walkthrough: Vec<CodeSegmentExplanation>,
}
