//! Prompt assembly

use crate::constants::content::MAX_DIFF_CONTEXT_CHARS;
use crate::diff::{parse_unified_diff, truncate_chars};

/// Deterministic prompt from a commit message and its diff.
///
/// A parseable diff is condensed to its per-file summary; anything else is
/// embedded raw. Both are capped at [`MAX_DIFF_CONTEXT_CHARS`].
pub fn build_prompt(message: &str, diff: &str) -> String {
    let context = match parse_unified_diff(diff) {
        Ok(parsed) if !parsed.is_empty() => {
            truncate_chars(&parsed.summary(), MAX_DIFF_CONTEXT_CHARS).to_string()
        }
        _ => truncate_chars(diff, MAX_DIFF_CONTEXT_CHARS).to_string(),
    };

    format!(
        "Update docs for this commit.\nCommit message: {}\nDiff:\n{}\nOutput updated section content only.",
        message, context
    )
}
