//! CLI Common Utilities
//!
//! Shared initialization and context management for CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::ai::build_client;
use crate::config::{Config, ConfigLoader};
use crate::doc::MarkdownUpdater;
use crate::git::{CommitSource, GitCli};
use crate::orchestrator::{Updater, UpdaterDeps};
use crate::storage::StateStore;
use crate::types::{GitDocError, Result};

/// Flags shared by every subcommand
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Config file override; relative paths start at the repository root
    pub config: Option<PathBuf>,
    pub dry_run: bool,
}

/// Command execution context
///
/// Repository, configuration and state resolved once per invocation.
#[derive(Clone)]
pub struct CommandContext {
    pub repo_root: PathBuf,
    pub config_path: PathBuf,
    pub config: Arc<Config>,
    pub store: StateStore,
    pub git: Arc<GitCli>,
}

impl CommandContext {
    /// Discover the repository from the working directory, load its config
    /// and open the state database.
    pub async fn load(opts: &GlobalOptions) -> Result<Self> {
        let git = discover_repo().await?;
        let repo_root = git.repo_root().to_path_buf();
        let config_path = config_path(&repo_root, opts);

        if !config_path.exists() {
            return Err(if opts.config.is_some() {
                GitDocError::Config(format!("config file {} not found", config_path.display()))
            } else {
                GitDocError::NotInitialized
            });
        }

        let config = ConfigLoader::load_from_file(&config_path)?;
        let db_path = ConfigLoader::resolve(&repo_root, Path::new(&config.state.db_path));
        debug!(db = %db_path.display(), "Opening state database");
        let store = StateStore::open(&db_path)?;

        Ok(Self {
            repo_root,
            config_path,
            config: Arc::new(config),
            store,
            git: Arc::new(git),
        })
    }

    /// Updater wired to this repository and the configured providers
    pub fn updater(&self) -> Result<Updater> {
        let client = build_client(&self.config.llm)?;
        debug!(provider = client.name(), "Generation client ready");

        Ok(Updater::new(UpdaterDeps {
            config: Arc::clone(&self.config),
            store: self.store.clone(),
            commit_source: self.git.clone(),
            client,
            doc_updater: Arc::new(MarkdownUpdater::new()),
        }))
    }
}

/// Repository containing the current directory
pub async fn discover_repo() -> Result<GitCli> {
    let cwd = std::env::current_dir()?;
    GitCli::discover(&cwd).await
}

/// Config file in effect: the `--config` override or `.git-doc/config.toml`.
pub fn config_path(repo_root: &Path, opts: &GlobalOptions) -> PathBuf {
    match &opts.config {
        Some(path) => ConfigLoader::resolve(repo_root, path),
        None => ConfigLoader::project_config_path(repo_root),
    }
}

/// Token cancelled on the first Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            child.cancel();
        }
    });
    token
}
