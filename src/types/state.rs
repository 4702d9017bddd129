//! Persistent state records
//!
//! Row types for the state database and the status enums they carry.
//! Enum string forms are the values stored in the database.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Processing lifecycle of one source commit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CommitStatus {
    Pending,
    InProgress,
    Success,
    Failed,
    Skipped,
}

impl CommitStatus {
    pub const ALL: [CommitStatus; 5] = [
        CommitStatus::Pending,
        CommitStatus::InProgress,
        CommitStatus::Success,
        CommitStatus::Failed,
        CommitStatus::Skipped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Terminal states end a commit's pipeline
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Skipped)
    }
}

impl fmt::Display for CommitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one planned (commit, doc file, section) update
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Planned,
    Applied,
    Failed,
    Unchanged,
}

impl PlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Applied => "applied",
            Self::Failed => "failed",
            Self::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a documentation target was chosen
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlanStrategy {
    /// A configured code pattern matched a changed path
    Mapping,
    /// An explicit marker in the commit named the target
    Comment,
    /// Fallback to the default doc file and section
    Inferred,
}

impl PlanStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mapping => "mapping",
            Self::Comment => "comment",
            Self::Inferred => "inferred",
        }
    }
}

impl fmt::Display for PlanStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

impl EventLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessedCommit {
    pub commit_hash: String,
    pub processed_at: String,
    pub status: CommitStatus,
    pub error: Option<String>,
    pub doc_commit_hash: Option<String>,
    pub doc_files_changed: Vec<String>,
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedUpdate {
    pub commit_hash: String,
    pub doc_file: String,
    pub section_id: String,
    pub strategy: PlanStrategy,
    pub status: PlanStatus,
    pub reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Memoized provider response, keyed by all six identity fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationCacheEntry {
    pub commit_hash: String,
    pub doc_file: String,
    pub section_id: String,
    pub provider: String,
    pub model: String,
    pub prompt_hash: String,
    pub response_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunEvent {
    pub run_id: String,
    pub commit_hash: Option<String>,
    pub level: EventLevel,
    pub component: String,
    pub message: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: String,
}

/// Link from a code commit to the documentation it produced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocMapping {
    pub code_commit_hash: String,
    pub doc_file: String,
    pub section: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: u64,
    pub in_progress: u64,
    pub success: u64,
    pub failed: u64,
    pub skipped: u64,
    pub total: u64,
}

impl StatusCounts {
    /// Add `count` rows of `status` to the tally
    pub fn add(&mut self, status: CommitStatus, count: u64) {
        match status {
            CommitStatus::Pending => self.pending += count,
            CommitStatus::InProgress => self.in_progress += count,
            CommitStatus::Success => self.success += count,
            CommitStatus::Failed => self.failed += count,
            CommitStatus::Skipped => self.skipped += count,
        }
        self.total += count;
    }
}
