//! Commit-to-documentation pipeline
//!
//! ## Flow
//!
//! ```text
//! resumable + new commits → per commit:
//!   changed files → target → prompt → cache | provider → validate
//!     → replace section → write → commit → record
//! ```
//!
//! Commits are processed strictly in order, one at a time. A failing commit
//! is recorded as failed and the run moves on; only setup failures (listing
//! commits, reading HEAD) abort an operation.

mod prompt;
mod updater;

#[cfg(test)]
mod tests;

pub use prompt::build_prompt;
pub use updater::{Updater, merge_unique, resolve_target, validate_generated_section};

use std::sync::Arc;

use serde::Serialize;

use crate::ai::SharedProvider;
use crate::config::Config;
use crate::doc::SharedDocumentUpdater;
use crate::git::SharedCommitSource;
use crate::storage::StateStore;
use crate::types::CommitStatus;

/// Aggregate outcome of one update operation
///
/// `processed == success + failed + skipped` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub processed: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Summary {
    /// Count one finished commit.
    pub fn record(&mut self, status: CommitStatus) {
        self.processed += 1;
        match status {
            CommitStatus::Success => self.success += 1,
            CommitStatus::Skipped => self.skipped += 1,
            _ => self.failed += 1,
        }
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "processed={} success={} failed={} skipped={}",
            self.processed, self.success, self.failed, self.skipped
        )
    }
}

/// Documentation file and section chosen for a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTarget {
    /// Path relative to the repository root
    pub doc_file: String,
    pub section: String,
}

/// Collaborators injected into the [`Updater`]
#[derive(Clone)]
pub struct UpdaterDeps {
    pub config: Arc<Config>,
    pub store: StateStore,
    pub commit_source: SharedCommitSource,
    pub client: SharedProvider,
    pub doc_updater: SharedDocumentUpdater,
}
