//! Line-based unified diffs between original and fixed code.
//!
//! The diff is returned as one string per line (no trailing newlines), the
//! shape the editor extension renders directly:
//!
//! ```text
//! --- original
//! +++ fixed
//! @@ -1 +1,2 @@
//! -print(1/0)
//! +x = 0
//! +print(1/x if x else 0)
//! ```

use anyhow::{Context, Result, bail};
use similar::{Algorithm, ChangeTag, TextDiff};

/// Unchanged lines shown around each hunk
pub const CONTEXT_RADIUS: usize = 3;

pub const ORIGINAL_HEADER: &str = "--- original";
pub const FIXED_HEADER: &str = "+++ fixed";

/// Number of file-header lines that open a non-empty diff
pub const HEADER_LINES: usize = 2;

/// Line counts of a diff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStat {
    pub added: usize,
    pub removed: usize,
}

/// Compute the unified diff of `original` → `modified`.
///
/// Identical inputs produce an empty vector.
pub fn unified_diff(original: &str, modified: &str) -> Vec<String> {
    let old: Vec<&str> = original.lines().collect();
    let new: Vec<&str> = modified.lines().collect();
    unified_diff_lines(&old, &new)
}

/// Compute the unified diff of two line sequences.
pub fn unified_diff_lines(old: &[&str], new: &[&str]) -> Vec<String> {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_slices(old, new);

    let mut lines = Vec::new();
    for hunk in diff.unified_diff().context_radius(CONTEXT_RADIUS).iter_hunks() {
        if lines.is_empty() {
            lines.push(ORIGINAL_HEADER.to_string());
            lines.push(FIXED_HEADER.to_string());
        }
        lines.push(hunk.header().to_string());
        for change in hunk.iter_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => '-',
                ChangeTag::Insert => '+',
                ChangeTag::Equal => ' ',
            };
            lines.push(format!("{}{}", sign, change.value()));
        }
    }
    lines
}

/// Count added and removed lines in a diff produced by [`unified_diff`].
pub fn diff_stat(diff: &[String]) -> DiffStat {
    let mut stat = DiffStat::default();
    let mut in_hunk = false;
    for line in diff {
        if line.starts_with("@@") {
            in_hunk = true;
        } else if in_hunk {
            match line.chars().next() {
                Some('+') => stat.added += 1,
                Some('-') => stat.removed += 1,
                _ => {}
            }
        }
    }
    stat
}

/// Parse a hunk range such as `3,4` or `7` into (start, len).
fn parse_range(range: &str) -> Result<(usize, usize)> {
    match range.split_once(',') {
        Some((start, len)) => Ok((
            start.parse().with_context(|| format!("Bad hunk start '{}'", start))?,
            len.parse().with_context(|| format!("Bad hunk length '{}'", len))?,
        )),
        None => Ok((
            range.parse().with_context(|| format!("Bad hunk start '{}'", range))?,
            1,
        )),
    }
}

/// Parse `@@ -a,b +c,d @@` and return the original-side (start, len).
fn parse_hunk_header(header: &str) -> Result<(usize, usize)> {
    let old = header
        .split_whitespace()
        .nth(1)
        .and_then(|part| part.strip_prefix('-'))
        .with_context(|| format!("Malformed hunk header: {}", header))?;
    parse_range(old)
}

/// Apply a diff produced by [`unified_diff`] to `original`, returning the
/// modified text with lines joined by `\n`.
pub fn apply_unified_diff(original: &str, diff: &[String]) -> Result<String> {
    let old: Vec<&str> = original.lines().collect();
    let mut out: Vec<&str> = Vec::with_capacity(old.len());
    let mut cursor = 0usize;
    let mut in_hunk = false;

    for line in diff {
        if line.starts_with("@@") {
            let (start, len) = parse_hunk_header(line)?;
            // A zero-length range names the line *after which* the hunk applies
            let target = if len == 0 { start } else { start.saturating_sub(1) };
            if target < cursor || target > old.len() {
                bail!("Hunk '{}' is out of order or past the end of the original", line);
            }
            out.extend_from_slice(&old[cursor..target]);
            cursor = target;
            in_hunk = true;
            continue;
        }

        if !in_hunk {
            // File headers precede the first hunk
            continue;
        }

        let (tag, text) = line.split_at(line.chars().next().map_or(0, char::len_utf8));
        match tag {
            " " | "-" => {
                let actual = old.get(cursor).copied();
                if actual != Some(text) {
                    bail!(
                        "Diff does not apply at original line {}: expected {:?}, found {:?}",
                        cursor + 1,
                        text,
                        actual
                    );
                }
                if tag == " " {
                    out.push(text);
                }
                cursor += 1;
            }
            "+" => out.push(text),
            _ => bail!("Unexpected diff line: {:?}", line),
        }
    }

    out.extend_from_slice(&old[cursor..]);
    Ok(out.join("\n"))
}
