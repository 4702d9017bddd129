//! Markdown section replacement
//!
//! A section starts at the first heading whose title matches (ignoring case
//! and surrounding whitespace) and runs until the next heading of the same
//! or higher level.

use super::DocumentUpdater;
use crate::types::{GitDocError, Result, ValidationError, ValidationErrorKind};

/// Line-based heading matcher for markdown documents
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownUpdater;

impl MarkdownUpdater {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentUpdater for MarkdownUpdater {
    fn extract_section(&self, content: &str, section: &str) -> Result<String> {
        let lines: Vec<&str> = content.split('\n').collect();
        let bounds = find_section_bounds(&lines, section)
            .ok_or_else(|| GitDocError::Validation(section_missing(section)))?;
        Ok(lines[bounds.start..bounds.end].join("\n"))
    }

    fn replace_section(&self, content: &str, section: &str, new_content: &str) -> Result<String> {
        let lines: Vec<&str> = content.split('\n').collect();
        let new_content = new_content.trim();

        let Some(bounds) = find_section_bounds(&lines, section) else {
            let body = content.trim_end_matches('\n');
            let mut out = String::with_capacity(body.len() + new_content.len() + section.len() + 8);
            out.push_str(body);
            if !body.is_empty() {
                out.push_str("\n\n");
            }
            out.push_str("## ");
            out.push_str(section.trim());
            out.push_str("\n\n");
            out.push_str(new_content);
            out.push('\n');
            return Ok(out);
        };

        let mut updated: Vec<&str> = Vec::with_capacity(lines.len());
        updated.extend_from_slice(&lines[..bounds.start]);
        if !new_content.is_empty() {
            updated.extend(new_content.split('\n'));
        }
        updated.extend_from_slice(&lines[bounds.end..]);
        Ok(updated.join("\n"))
    }
}

fn section_missing(section: &str) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::SectionMissing,
        format!("section {:?} not found", section),
    )
}

/// Body line range of a section: heading and surrounding blank lines excluded
#[derive(Debug, PartialEq, Eq)]
struct SectionBounds {
    start: usize,
    end: usize,
}

fn find_section_bounds(lines: &[&str], section: &str) -> Option<SectionBounds> {
    let target = section.trim().to_lowercase();

    let (heading_idx, level) = lines.iter().enumerate().find_map(|(i, line)| {
        let line = line.trim();
        if !line.starts_with('#') {
            return None;
        }
        let title = line.trim_start_matches('#').trim().to_lowercase();
        (title == target).then(|| (i, heading_level(line)))
    })?;

    let mut end = lines[heading_idx + 1..]
        .iter()
        .position(|line| {
            let line = line.trim();
            line.starts_with('#') && heading_level(line) <= level
        })
        .map_or(lines.len(), |offset| heading_idx + 1 + offset);

    let mut start = heading_idx + 1;
    while start < end && lines[start].trim().is_empty() {
        start += 1;
    }
    // Keep separating blank lines before the next heading or end of file.
    while end > start && lines[end - 1].trim().is_empty() {
        end -= 1;
    }

    Some(SectionBounds { start, end })
}

/// Count of leading `#`; lines without one rank below every heading.
fn heading_level(line: &str) -> usize {
    match line.chars().take_while(|&c| c == '#').count() {
        0 => 7,
        n => n,
    }
}
