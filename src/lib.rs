//! git-doc - Commit-Driven Documentation Updates
//!
//! Watches a repository's history and keeps documentation sections in step
//! with code changes: each new commit is summarized into a prompt, an LLM
//! provider writes the section, and the result is written back and
//! optionally committed.
//!
//! ## Core Features
//!
//! - **Resumable**: per-commit state in SQLite; interrupted commits are retried
//! - **Provider Failover**: retries with backoff, then falls through to fallbacks
//! - **Generation Cache**: identical prompts never hit a provider twice
//! - **Atomic Writes**: documents are replaced via temp file and rename
//!
//! ## Quick Start
//!
//! ```ignore
//! use git_doc::{CommandContext, GlobalOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! let ctx = CommandContext::load(&GlobalOptions::default()).await?;
//! let summary = ctx
//!     .updater()?
//!     .update_new_commits(&CancellationToken::new(), false)
//!     .await?;
//! println!("{}", summary);
//! ```
//!
//! ## Modules
//!
//! - [`orchestrator`]: the per-commit pipeline and update operations
//! - [`ai`]: LLM providers, the resilient client, cancellation helpers
//! - [`storage`]: SQLite persistence with connection pooling
//! - [`git`]: commit source abstraction over the `git` executable
//! - [`doc`]: markdown section editing and atomic file writes
//! - [`config`]: layered configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod diff;
pub mod doc;
pub mod git;
pub mod orchestrator;
pub mod runlock;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, GitConfig, LlmConfig, MappingRule};

// Error Types
pub use types::error::{ErrorCategory, GitDocError, LlmError, Result, ResultExt};

// Storage
pub use storage::{Database, SharedDatabase, StateStore};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use orchestrator::{DocTarget, Summary, Updater, UpdaterDeps};

pub use ai::{LlmProvider, MockProvider, ResilientClient, SharedProvider, build_client};

pub use doc::{DocumentUpdater, MarkdownUpdater};

pub use git::{CommitInfo, CommitSource, GitCli};

pub use cli::{CommandContext, GlobalOptions};

pub use runlock::RunLock;
