//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Project config (.git-doc/config.toml)
//! 3. Environment variables (GITDOC_* prefix, `__` separates sections)
//!
//! `${VAR}` references inside string values are expanded afterwards.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use tracing::debug;

use super::types::Config;
use crate::constants::state;
use crate::types::{GitDocError, Result};

static ENV_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("env reference pattern compiles")
});

const DEFAULT_TOML: &str = r#"# Documentation files; the first one receives updates no mapping claims
doc_files = ["README.md", "docs/**/*.md"]

# Route changes to specific sections (first match wins)
# [[mappings]]
# code_pattern = "src/api/"
# doc_file = "docs/api.md"
# section = "Endpoints"

[llm]
provider = "mock"
api_key = "${GITDOC_OPENAI_KEY}"
model = "gpt-4o-mini"
timeout = 60
max_retries = 3
failover_enabled = true
fallback_providers = []

[git]
commit_doc_updates = true
amend_original = false
doc_commit_message = "docs: auto-update for {hash}"

[state]
db_path = ".git-doc/state.db"

[runtime]
default_section = "Recent Changes"
"#;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load, expand and validate the config at `path`.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(GitDocError::Config(format!(
                "config file {} not found",
                path.display()
            )));
        }

        debug!("Loading config from: {}", path.display());
        let mut config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("GITDOC_").split("__"))
            .extract()
            .map_err(|e| GitDocError::Config(format!("Configuration error: {}", e)))?;

        Self::expand_env(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Replace `${VAR}` and `$VAR` with environment values (unset → empty).
    pub fn expand_env(config: &mut Config) {
        if let Some(key) = config.llm.api_key.as_mut() {
            *key = expand(key);
        }
        config.state.db_path = expand(&config.state.db_path);
        for doc in &mut config.doc_files {
            *doc = expand(doc);
        }
        for mapping in &mut config.mappings {
            mapping.code_pattern = expand(&mapping.code_pattern);
            mapping.doc_file = expand(&mapping.doc_file);
            mapping.section = expand(&mapping.section);
        }
    }

    /// Starter config written by `init`
    pub fn default_toml() -> &'static str {
        DEFAULT_TOML
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Data directory under a repository root
    pub fn project_dir(root: &Path) -> PathBuf {
        root.join(state::DATA_DIR)
    }

    /// Default config path under a repository root
    pub fn project_config_path(root: &Path) -> PathBuf {
        root.join(state::CONFIG_PATH)
    }

    /// Relative paths are taken from the repository root.
    pub fn resolve(root: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }

    /// Create the data directory and write the starter config if absent.
    ///
    /// Returns the config path and whether it was newly written.
    pub fn init_project(root: &Path) -> Result<(PathBuf, bool)> {
        fs::create_dir_all(Self::project_dir(root))?;
        let path = Self::project_config_path(root);
        if path.exists() {
            return Ok((path, false));
        }
        fs::write(&path, DEFAULT_TOML)?;
        Ok((path, true))
    }
}

fn expand(value: &str) -> String {
    ENV_REF
        .replace_all(value, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            std::env::var(name).unwrap_or_default()
        })
        .into_owned()
}
