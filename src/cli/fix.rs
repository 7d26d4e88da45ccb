use anyhow::{Context, Result, bail};

use crate::cli::{ModelArgs, SourceArgs};
use crate::core::assistant::Assistant;
use crate::core::config::WingmanConfig;
use crate::core::diff;
use crate::core::schemas::SuggestFixesRequest;
use crate::core::style;

pub async fn run(
    config: &WingmanConfig,
    source: SourceArgs,
    error: String,
    request: String,
    write: bool,
    model: ModelArgs,
) -> Result<()> {
    if write && source.is_stdin() {
        bail!("--write needs a file path; code was read from stdin");
    }
    if error.trim().is_empty() && request.trim().is_empty() {
        bail!(
            "Nothing to fix: pass --error with the error message or --request with the change you want"
        );
    }

    let (code, language) = source.read()?;
    let llm_request = model.llm_request(config);
    eprintln!(
        "{}",
        style::request_header("suggest-fixes", &llm_request.provider, &llm_request.model)
    );

    let req = SuggestFixesRequest {
        code,
        error_message: error,
        user_request: request,
        language,
        llm_request: Some(llm_request),
    };
    let resp = Assistant::from_config(config).suggest_fixes(&req).await?;

    println!("{}", style::header("Fixes"));
    if resp.fixes.is_empty() {
        println!("{}", style::hint("  (the model did not describe its changes)"));
    }
    for fix in &resp.fixes {
        println!("{}", style::bullet(fix));
    }

    println!();
    if resp.differences.is_empty() {
        println!("{}", style::warning("The suggested code is identical to the original."));
        return Ok(());
    }

    let stat = diff::diff_stat(&resp.differences);
    println!(
        "{} {}",
        style::section("Changes:"),
        style::diff_stat(stat.added, stat.removed)
    );
    for line in style::diff_lines(&resp.differences) {
        println!("{}", line);
    }

    if write {
        let mut fixed = resp.fixed_code;
        if !fixed.ends_with('\n') {
            fixed.push('\n');
        }
        std::fs::write(&source.file, fixed)
            .with_context(|| format!("Failed to write {}", source.file.display()))?;
        eprintln!(
            "{}",
            style::success(&format!("Wrote fixed code to {}", source.file.display()))
        );
    }

    Ok(())
}
