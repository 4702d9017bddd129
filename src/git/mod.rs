//! Source-control access
//!
//! The orchestrator only sees the [`CommitSource`] trait; [`GitCli`] is the
//! production implementation shelling out to `git`.

mod cli;

pub use cli::{GitCli, parse_log_output};

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::Result;

/// One entry of a commit range listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub hash: String,
    pub author: String,
    pub email: String,
    pub timestamp: DateTime<Utc>,
    pub subject: String,
}

/// Repository operations needed to process and commit documentation updates
#[async_trait]
pub trait CommitSource: Send + Sync {
    /// Working tree root; doc paths are relative to it
    fn repo_root(&self) -> &Path;

    async fn current_head(&self) -> Result<String>;

    /// Commits after `from` (exclusive) up to `to` (inclusive), oldest first.
    /// An empty `from` lists every ancestor of `to`.
    async fn commit_range(&self, from: &str, to: &str) -> Result<Vec<CommitInfo>>;

    /// Unified diff of a single commit
    async fn diff(&self, commit: &str) -> Result<String>;

    /// Full commit message, trimmed
    async fn message(&self, commit: &str) -> Result<String>;

    /// Paths touched by the commit, forward-slash separated
    async fn changed_files(&self, commit: &str) -> Result<Vec<String>>;

    /// Stage `paths` and create a new commit; returns its hash.
    async fn stage_and_commit(&self, paths: &[String], message: &str) -> Result<String>;

    /// Stage `paths` into the current HEAD commit; returns the amended hash.
    async fn stage_and_amend(&self, paths: &[String]) -> Result<String>;

    /// Create a commit reverting `commit`
    async fn revert(&self, commit: &str) -> Result<()>;
}

pub type SharedCommitSource = Arc<dyn CommitSource>;
