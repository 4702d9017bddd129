//! Documentation file editing
//!
//! - `markdown`: heading-delimited section replace/extract
//! - `fileio`: line-ending handling and atomic writes

pub mod fileio;
pub mod markdown;

pub use fileio::{atomic_write_file, detect_line_ending, normalize_line_endings};
pub use markdown::MarkdownUpdater;

use std::sync::Arc;

use crate::types::Result;

/// Section-level document editing
pub trait DocumentUpdater: Send + Sync {
    /// Body text of `section`; errors when the heading is absent.
    fn extract_section(&self, content: &str, section: &str) -> Result<String>;

    /// Replace the body of `section` with `new_content`, appending a new
    /// level-2 section when the heading is absent.
    fn replace_section(&self, content: &str, section: &str, new_content: &str) -> Result<String>;
}

pub type SharedDocumentUpdater = Arc<dyn DocumentUpdater>;
