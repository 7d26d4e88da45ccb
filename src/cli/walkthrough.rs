use anyhow::Result;
use colored::Colorize;

use crate::cli::{ModelArgs, SourceArgs};
use crate::core::assistant::Assistant;
use crate::core::config::WingmanConfig;
use crate::core::schemas::CodeWalkthroughRequest;
use crate::core::style;

pub async fn run(
    config: &WingmanConfig,
    source: SourceArgs,
    focus: Option<String>,
    model: ModelArgs,
) -> Result<()> {
    let (code, language) = source.read()?;
    let llm_request = model.llm_request(config);
    eprintln!(
        "{}",
        style::request_header("code-walkthrough", &llm_request.provider, &llm_request.model)
    );

    let req = CodeWalkthroughRequest {
        code,
        focus_on: focus,
        language,
        llm_request: Some(llm_request),
    };
    let resp = Assistant::from_config(config).code_walkthrough(&req).await?;

    if resp.walkthrough.is_empty() {
        println!("{}", style::warning("The model returned an empty walkthrough."));
        return Ok(());
    }

    println!("{}", style::header("Walkthrough"));
    let total = resp.walkthrough.len();
    for (i, step) in resp.walkthrough.iter().enumerate() {
        println!();
        println!(
            "{} {}",
            style::section("Segment"),
            format!("({}/{})", i + 1, total).dimmed()
        );
        for line in step.segment.lines() {
            println!("    {}", line.cyan());
        }
        println!();
        for line in step.step.lines() {
            println!("  {}", line);
        }
    }

    Ok(())
}
