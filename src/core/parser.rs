//! Parse raw model output into the typed capability responses.
//!
//! Models are asked for a bare JSON object but often wrap it in markdown fences
//! or add a sentence around it. Both are tolerated; anything else that does not
//! deserialize into the documented shape is a `MalformedOutput` error.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::schemas::{
    CodeSegmentExplanation, CodeWalkthroughResponse, ExplainErrorsResponse,
    GenerateTestCasesResponse, TestCase,
};
use crate::error::{WingmanError, excerpt};

/// What the model returns for a fix request, before the diff is attached
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FixOutput {
    pub fixed_code: String,
    #[serde(default)]
    pub fixes: Vec<String>,
}

// ---------- Raw model shapes ----------

#[derive(Debug, Deserialize)]
struct RawTestCases {
    #[serde(alias = "test_cases", alias = "testcase")]
    testcases: Vec<RawTestCase>,
}

#[derive(Debug, Deserialize)]
struct RawTestCase {
    input: Value,
    expected_output: Value,
    #[serde(default)]
    explanation: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawWalkthrough {
    walkthrough: Vec<RawSegment>,
}

#[derive(Debug, Deserialize)]
struct RawSegment {
    segment: String,
    step: StepText,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StepText {
    Text(String),
    Lines(Vec<String>),
}

impl StepText {
    fn into_string(self) -> String {
        match self {
            StepText::Text(s) => s,
            StepText::Lines(lines) => lines.join("\n"),
        }
    }
}

// ---------- Extraction ----------

const FENCE: &str = "```";
const REPLY_EXCERPT_CHARS: usize = 200;

/// Body of the first markdown code fence (```json ... ```) anywhere in `content`.
///
/// An unterminated fence runs to the end of the reply.
fn fenced_block(content: &str) -> Option<&str> {
    let open = content.find(FENCE)?;
    let after_open = &content[open + FENCE.len()..];

    // Drop the info string (`json`, `JSON`, ...) on the opening fence line
    let body = match after_open.find('\n') {
        Some(nl) => &after_open[nl + 1..],
        None => after_open,
    };
    let body = match body.find(FENCE) {
        Some(close) => &body[..close],
        None => body,
    };
    Some(body.trim())
}

/// Every JSON object that parses starting at a `{` in `text`, in order.
///
/// Whatever trails an object is ignored, and the scan resumes after it, so
/// nested objects are not reported twice.
fn objects_in(text: &str) -> Vec<Value> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(offset) = text[pos..].find('{') {
        let start = pos + offset;
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value @ Value::Object(_))) => {
                found.push(value);
                pos = start + stream.byte_offset();
            }
            _ => pos = start + 1,
        }
    }
    found
}

/// Candidate JSON objects in model output, most likely first: objects inside
/// a fenced block, then objects found anywhere in the reply.
fn json_candidates(content: &str) -> Vec<Value> {
    let mut candidates = fenced_block(content).map(objects_in).unwrap_or_default();
    candidates.extend(objects_in(content));
    candidates
}

/// Parse the first JSON object in `content` that has the shape of `T`.
pub fn parse_json<T: DeserializeOwned>(
    capability: &'static str,
    content: &str,
) -> Result<T, WingmanError> {
    let mut first_error = None;
    for candidate in json_candidates(content) {
        match serde_json::from_value(candidate) {
            Ok(parsed) => return Ok(parsed),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    let reason = match first_error {
        Some(e) => format!(
            "{} (model output: {})",
            e,
            excerpt(content, REPLY_EXCERPT_CHARS)
        ),
        None => format!(
            "no JSON object found in model output: {}",
            excerpt(content, REPLY_EXCERPT_CHARS)
        ),
    };
    Err(WingmanError::malformed(capability, reason))
}

/// Render a JSON value as the plain string a test harness would compare against.
fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

// ---------- Per-capability parsers ----------

pub fn parse_explanation(content: &str) -> Result<ExplainErrorsResponse, WingmanError> {
    let response: ExplainErrorsResponse = parse_json("explain-errors", content)?;
    if response.explanation.trim().is_empty() {
        return Err(WingmanError::malformed(
            "explain-errors",
            "\"explanation\" is empty",
        ));
    }
    Ok(response)
}

pub fn parse_fix(content: &str) -> Result<FixOutput, WingmanError> {
    parse_json("suggest-fixes", content)
}

/// Parse test cases, coercing every input value and expected output to a string.
///
/// Extra test cases beyond `expected` are dropped; fewer is an error.
pub fn parse_testcases(
    content: &str,
    expected: usize,
) -> Result<GenerateTestCasesResponse, WingmanError> {
    const CAPABILITY: &str = "generate-testcases";

    let raw: RawTestCases = parse_json(CAPABILITY, content)?;

    if raw.testcases.len() < expected {
        return Err(WingmanError::malformed(
            CAPABILITY,
            format!(
                "expected {} test case(s), model returned {}",
                expected,
                raw.testcases.len()
            ),
        ));
    }

    let mut testcases = Vec::with_capacity(expected);
    for (i, case) in raw.testcases.into_iter().take(expected).enumerate() {
        let Value::Object(fields) = case.input else {
            return Err(WingmanError::malformed(
                CAPABILITY,
                format!("test case {} has a non-object \"input\"", i + 1),
            ));
        };

        let input: BTreeMap<String, String> = fields
            .into_iter()
            .map(|(name, value)| (name, stringify(value)))
            .collect();

        let explanation = match case.explanation {
            None | Some(Value::Null) => None,
            Some(value) => Some(stringify(value)),
        };

        testcases.push(TestCase {
            input,
            expected_output: stringify(case.expected_output),
            explanation,
        });
    }

    Ok(GenerateTestCasesResponse { testcases })
}

pub fn parse_walkthrough(content: &str) -> Result<CodeWalkthroughResponse, WingmanError> {
    let raw: RawWalkthrough = parse_json("code-walkthrough", content)?;
    let walkthrough = raw
        .walkthrough
        .into_iter()
        .map(|s| CodeSegmentExplanation {
            segment: s.segment,
            step: s.step.into_string(),
        })
        .collect();
    Ok(CodeWalkthroughResponse { walkthrough })
}

// ---------- Tests ----------
