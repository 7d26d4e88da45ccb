use anyhow::Result;

use crate::cli::{ModelArgs, SourceArgs};
use crate::core::assistant::Assistant;
use crate::core::config::WingmanConfig;
use crate::core::schemas::{GenerateTestCasesRequest, TestCase};
use crate::core::style;

pub async fn run(
    config: &WingmanConfig,
    source: SourceArgs,
    count: u32,
    explanation: Option<String>,
    model: ModelArgs,
) -> Result<()> {
    let (code, language) = source.read()?;
    let llm_request = model.llm_request(config);
    eprintln!(
        "{}",
        style::request_header("generate-testcases", &llm_request.provider, &llm_request.model)
    );

    let req = GenerateTestCasesRequest {
        code,
        code_explanation: explanation,
        num_testcases: count,
        language,
        llm_request: Some(llm_request),
    };
    let resp = Assistant::from_config(config).generate_testcases(&req).await?;

    println!("{}", style::header("Generated Test Cases"));
    for (i, case) in resp.testcases.iter().enumerate() {
        println!();
        print_case(i + 1, case);
    }

    Ok(())
}

fn print_case(index: usize, case: &TestCase) {
    println!("{}", style::section(&format!("Test case {}", index)));

    let input = if case.input.is_empty() {
        "(none)".to_string()
    } else {
        case.input
            .iter()
            .map(|(name, value)| format!("{} = {}", name, value))
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("{}", style::summary_line("Input", &input));
    println!("{}", style::summary_line("Expected output", &case.expected_output));
    if let Some(explanation) = &case.explanation {
        println!("{}", style::summary_line("Explanation", explanation));
    }
}
