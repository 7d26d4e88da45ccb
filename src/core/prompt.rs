//! Prompt assembly.
//!
//! Each capability has one fixed template. Fields are substituted verbatim in a
//! single pass, so placeholder-looking text inside user code (`{code}`, `{n}`)
//! is left untouched. `{{` and `}}` render as literal braces.

use crate::core::schemas::{
    CodeWalkthroughRequest, ExplainErrorsRequest, GenerateTestCasesRequest, SuggestFixesRequest,
};

/// Rendered in place of an absent optional field.
const NONE: &str = "None";

/// A named template with `{field}` placeholders
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub text: &'static str,
}

impl PromptTemplate {
    /// Substitute `fields` into the template.
    ///
    /// Unknown placeholders are kept as written.
    pub fn render(&self, fields: &[(&str, &str)]) -> String {
        let field_len: usize = fields.iter().map(|(_, value)| value.len()).sum();
        let mut out = String::with_capacity(self.text.len() + field_len);
        let mut rest = self.text;

        while let Some(pos) = rest.find(['{', '}']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if tail.starts_with("{{") {
                out.push('{');
                rest = &tail[2..];
            } else if tail.starts_with("}}") {
                out.push('}');
                rest = &tail[2..];
            } else if tail.starts_with('{') {
                match tail[1..].find('}') {
                    Some(end) => {
                        let name = &tail[1..1 + end];
                        match fields.iter().find(|(key, _)| *key == name) {
                            Some((_, value)) => out.push_str(value),
                            None => out.push_str(&tail[..end + 2]),
                        }
                        rest = &tail[end + 2..];
                    }
                    None => {
                        out.push_str(tail);
                        rest = "";
                    }
                }
            } else {
                out.push('}');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

// ---------- Templates ----------

pub const EXPLAIN_ERRORS: PromptTemplate = PromptTemplate {
    name: "explain-errors",
    text: "\
You are an AI debugging assistant that reads a code snippet and the error message it produced.
Your job is to:
1. Clearly explain what the error message means.
2. List the possible causes of the error.

Return your output strictly in this JSON format:
{{
  \"explanation\": \"...\",
  \"possible_causes\": [\"...\", \"...\"]
}}

Here is the code written in {language}:
<code>
{code}
</code>

And here is the error message:
<error_message>
{error_message}
</error_message>

Only return a valid JSON object in the format shown above.
",
};

pub const SUGGEST_FIXES: PromptTemplate = PromptTemplate {
    name: "suggest-fixes",
    text: "\
You are an AI debugging assistant that reads a code snippet and the error message it produced.
If the code has no errors you are given the user's request instead.
Your job is to:
1. Produce new code that fixes the errors or fulfils the user's request.
2. Explain each fix you made.

Return your output strictly in this JSON format:
{{
  \"fixed_code\": \"...\",
  \"fixes\": [\"...\", \"...\"]
}}

Here is the code written in {language}:
<code>
{code}
</code>

And here is the error message (if any):
<error_message>
{error_message}
</error_message>

And here is the user's request (if any):
<user_request>
{user_request}
</user_request>

Only return a valid JSON object in the format shown above. \"fixed_code\" must contain the complete program, not a fragment.
",
};

pub const GENERATE_TESTCASES: PromptTemplate = PromptTemplate {
    name: "generate-testcases",
    text: "\
You are an AI testing assistant that reads a code snippet and, if provided, its explanation.
Your task is to generate exactly {n} test cases for the given code.

Return your output strictly in the following JSON format:
{{
  \"testcases\": [
    {{
      \"input\": {{\"<parameter name>\": \"<value>\", ...}},
      \"expected_output\": \"<expected output for the test case>\",
      \"explanation\": \"<optional explanation for the test case>\"
    }},
    ...
  ]
}}

Here is the code written in {language}:
<code>
{code}
</code>

And here is the code explanation (optional):
<code_explanation>
{code_explanation}
</code_explanation>

Important:
- Return only a valid JSON object.
- Do not add any prose or commentary outside the JSON.
- \"input\" must be an object with one entry per parameter.
- All input values and expected_output must be strings.
",
};

pub const CODE_WALKTHROUGH: PromptTemplate = PromptTemplate {
    name: "code-walkthrough",
    text: "\
You are an AI assistant that reads a code snippet and explains its functionality as a structured walkthrough.
Divide the code into meaningful segments and explain each segment step by step.
Focus especially on: {focus_on}

Return your output strictly in the following JSON format:
{{
  \"walkthrough\": [
    {{
      \"segment\": \"<the portion of the code you are explaining>\",
      \"step\": \"<explanation of what happens in this segment>\"
    }},
    ...
  ]
}}

Here is the code written in {language}:
<code>
{code}
</code>

Important:
- Do not include any text outside the JSON.
- Segments that need no explanation may be skipped.
- Ensure the JSON is valid and follows the format above.
",
};

// ---------- Per-capability assembly ----------

pub fn explain_errors(req: &ExplainErrorsRequest) -> String {
    EXPLAIN_ERRORS.render(&[
        ("language", req.language.as_str()),
        ("code", req.code.as_str()),
        ("error_message", req.error_message.as_str()),
    ])
}

pub fn suggest_fixes(req: &SuggestFixesRequest) -> String {
    SUGGEST_FIXES.render(&[
        ("language", req.language.as_str()),
        ("code", req.code.as_str()),
        ("error_message", req.error_message.as_str()),
        ("user_request", req.user_request.as_str()),
    ])
}

pub fn generate_testcases(req: &GenerateTestCasesRequest) -> String {
    let n = req.num_testcases.to_string();
    GENERATE_TESTCASES.render(&[
        ("n", n.as_str()),
        ("language", req.language.as_str()),
        ("code", req.code.as_str()),
        (
            "code_explanation",
            req.code_explanation.as_deref().unwrap_or(NONE),
        ),
    ])
}

pub fn code_walkthrough(req: &CodeWalkthroughRequest) -> String {
    CODE_WALKTHROUGH.render(&[
        ("focus_on", req.focus_on.as_deref().unwrap_or(NONE)),
        ("language", req.language.as_str()),
        ("code", req.code.as_str()),
    ])
}
