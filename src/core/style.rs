//! Consistent colored terminal output for the wingman CLI.
//!
//! Colors are automatically disabled when stdout/stderr is not a TTY.

use colored::Colorize;

use crate::core::diff;

// ---------- Prefixes / Labels ----------

/// Format a header line: "=== Title ==="
pub fn header(title: &str) -> String {
    format!("=== {} ===", title.bold())
}

/// "wingman: explain-errors via ollama/gemma:7b"
pub fn request_header(capability: &str, provider: &str, model: &str) -> String {
    format!(
        "{}: {} {}",
        "wingman".bold().cyan(),
        capability.bold(),
        format!("via {}/{}", provider, model).dimmed()
    )
}

// ---------- Status indicators ----------

/// Green checkmark + message (success)
pub fn success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg)
}

/// Yellow warning + message
pub fn warning(msg: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), msg)
}

/// Red error + message
pub fn error(msg: &str) -> String {
    format!("{} {}", "✗".red().bold(), msg)
}

/// Dim info/hint message
pub fn hint(msg: &str) -> String {
    format!("{}", msg.dimmed())
}

/// Bold section label
pub fn section(label: &str) -> String {
    format!("{}", label.bold())
}

/// Bulleted list item
pub fn bullet(item: &str) -> String {
    format!("  {} {}", "•".cyan(), item)
}

/// Format a key-value line with aligned values
pub fn summary_line(key: &str, value: &str) -> String {
    format!("  {:<18} {}", format!("{}:", key).dimmed(), value)
}

// ---------- Diff ----------

/// Color a diff from [`diff::unified_diff`]: the two file headers bold, then
/// each body line by its prefix.
pub fn diff_lines(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i < diff::HEADER_LINES {
                format!("{}", line.bold())
            } else {
                diff_line(line)
            }
        })
        .collect()
}

/// Color one unified-diff body line by its prefix
pub fn diff_line(line: &str) -> String {
    if line.starts_with("@@") {
        format!("{}", line.cyan())
    } else if line.starts_with('+') {
        format!("{}", line.green())
    } else if line.starts_with('-') {
        format!("{}", line.red())
    } else {
        line.to_string()
    }
}

/// "+3 -1"
pub fn diff_stat(added: usize, removed: usize) -> String {
    format!(
        "{} {}",
        format!("+{}", added).green(),
        format!("-{}", removed).red()
    )
}
