use anyhow::Result;

use crate::cli::{ModelArgs, SourceArgs};
use crate::core::assistant::Assistant;
use crate::core::config::WingmanConfig;
use crate::core::schemas::ExplainErrorsRequest;
use crate::core::style;

pub async fn run(
    config: &WingmanConfig,
    source: SourceArgs,
    error: String,
    model: ModelArgs,
) -> Result<()> {
    let (code, language) = source.read()?;
    let llm_request = model.llm_request(config);
    eprintln!(
        "{}",
        style::request_header("explain-errors", &llm_request.provider, &llm_request.model)
    );

    let req = ExplainErrorsRequest {
        code,
        error_message: error,
        language,
        llm_request: Some(llm_request),
    };
    let resp = Assistant::from_config(config).explain_errors(&req).await?;

    println!("{}", style::header("Explanation"));
    println!("{}", resp.explanation.trim());

    if !resp.possible_causes.is_empty() {
        println!();
        println!("{}", style::section("Possible causes:"));
        for cause in &resp.possible_causes {
            println!("{}", style::bullet(cause));
        }
    }

    Ok(())
}
