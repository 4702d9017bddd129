//! Unified Diff Summaries
//!
//! Parses `git show` output into per-file hunk and line statistics so
//! prompts carry a compact description instead of the raw patch.

use crate::types::{GitDocError, Result};

/// Parsed multi-file unified diff
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedDiff {
    pub files: Vec<FileDiff>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDiff {
    /// Post-image path from the `+++ b/` header; empty when absent
    pub path: String,
    pub hunks: Vec<Hunk>,
    pub added_lines: usize,
    pub deleted_lines: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: u32,
    pub old_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    pub lines: Vec<String>,
}

impl UnifiedDiff {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Human-readable digest: file count, then one line per file.
    pub fn summary(&self) -> String {
        if self.files.is_empty() {
            return "No parseable file-level diff information available.".to_string();
        }

        let mut lines = Vec::with_capacity(self.files.len() + 1);
        lines.push(format!("Files changed: {}", self.files.len()));
        for file in &self.files {
            let path = if file.path.trim().is_empty() {
                "(unknown path)"
            } else {
                file.path.as_str()
            };
            lines.push(format!(
                "- {} (hunks={}, +{}, -{})",
                path,
                file.hunks.len(),
                file.added_lines,
                file.deleted_lines
            ));
        }
        lines.join("\n")
    }
}

/// Parse unified diff text.
///
/// Blank input yields an empty diff. Lines outside a hunk are ignored;
/// a malformed `@@` header fails the whole parse.
pub fn parse_unified_diff(raw: &str) -> Result<UnifiedDiff> {
    let mut result = UnifiedDiff::default();
    if raw.trim().is_empty() {
        return Ok(result);
    }

    let mut current_file: Option<FileDiff> = None;
    let mut current_hunk: Option<Hunk> = None;

    for line in raw.split('\n') {
        if line.starts_with("diff --git ") {
            flush(&mut result, &mut current_file, &mut current_hunk);
            current_file = Some(FileDiff::default());
        } else if let Some(path) = line.strip_prefix("+++ b/") {
            if let Some(file) = current_file.as_mut() {
                file.path = path.to_string();
            }
        } else if line.starts_with("@@") {
            if let (Some(file), Some(hunk)) = (current_file.as_mut(), current_hunk.take()) {
                file.hunks.push(hunk);
            }
            current_hunk = Some(parse_hunk_header(line)?);
        } else if let (Some(file), Some(hunk)) = (current_file.as_mut(), current_hunk.as_mut()) {
            hunk.lines.push(line.to_string());
            if line.starts_with('+') && !line.starts_with("+++") {
                file.added_lines += 1;
            }
            if line.starts_with('-') && !line.starts_with("---") {
                file.deleted_lines += 1;
            }
        }
    }

    flush(&mut result, &mut current_file, &mut current_hunk);
    Ok(result)
}

fn flush(result: &mut UnifiedDiff, file: &mut Option<FileDiff>, hunk: &mut Option<Hunk>) {
    if let Some(mut file) = file.take() {
        if let Some(hunk) = hunk.take() {
            file.hunks.push(hunk);
        }
        result.files.push(file);
    } else {
        *hunk = None;
    }
}

/// `@@ -a[,b] +c[,d] @@ optional-context`
fn parse_hunk_header(header: &str) -> Result<Hunk> {
    let core = header
        .split("@@")
        .nth(1)
        .ok_or_else(|| GitDocError::Diff(format!("invalid hunk header: {}", header)))?;

    let fields: Vec<&str> = core.split_whitespace().collect();
    let [old, new, ..] = fields.as_slice() else {
        return Err(GitDocError::Diff(format!("invalid hunk header core: {}", header)));
    };

    let (old_start, old_lines) = parse_range(old, '-')?;
    let (new_start, new_lines) = parse_range(new, '+')?;
    Ok(Hunk {
        old_start,
        old_lines,
        new_start,
        new_lines,
        lines: Vec::new(),
    })
}

fn parse_range(token: &str, prefix: char) -> Result<(u32, u32)> {
    let trimmed = token.strip_prefix(prefix).unwrap_or(token);
    let (start, count) = match trimmed.split_once(',') {
        Some((start, count)) => (start, Some(count)),
        None => (trimmed, None),
    };

    let start = start
        .parse()
        .map_err(|e| GitDocError::Diff(format!("invalid start in token {}: {}", token, e)))?;
    let count = match count {
        Some(count) => count
            .parse()
            .map_err(|e| GitDocError::Diff(format!("invalid count in token {}: {}", token, e)))?,
        None => 1,
    };
    Ok((start, count))
}

/// First `max_chars` characters of `content`; zero disables the cap.
pub fn truncate_chars(content: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return content;
    }
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &content[..byte_idx],
        None => content,
    }
}
