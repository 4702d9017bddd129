//! Configuration Types
//!
//! All configuration structures with their defaults.

use serde::{Deserialize, Serialize};

use crate::constants::{chain, content, git, provider, state};
use crate::types::{GitDocError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Documentation files eligible as targets; the first is the fallback target
    pub doc_files: Vec<String>,

    /// Ordered code-pattern → doc target rules (first match wins)
    pub mappings: Vec<MappingRule>,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// Source-control behaviour for applied updates
    pub git: GitConfig,

    /// Persistent state location
    pub state: StateConfig,

    pub runtime: RuntimeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            doc_files: vec!["README.md".to_string(), "docs/**/*.md".to_string()],
            mappings: Vec::new(),
            llm: LlmConfig::default(),
            git: GitConfig::default(),
            state: StateConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl Config {
    /// Validate settings and fill in fallbacks for blank optional values.
    /// Returns `GitDocError::Config` on validation failure.
    pub fn validate(&mut self) -> Result<()> {
        let provider_name = normalize_provider(&self.llm.provider);
        if provider_name.is_empty() {
            return Err(GitDocError::Config("llm.provider is required".to_string()));
        }
        if !is_supported_provider(&provider_name) {
            return Err(GitDocError::Config(format!(
                "unsupported llm.provider: {}",
                self.llm.provider
            )));
        }

        for fallback in &self.llm.fallback_providers {
            let name = normalize_provider(fallback);
            if !name.is_empty() && !is_supported_provider(&name) {
                return Err(GitDocError::Config(format!(
                    "unsupported llm.fallback_provider: {}",
                    fallback
                )));
            }
        }

        if provider::REQUIRES_API_KEY.contains(&provider_name.as_str()) && !self.llm.has_api_key()
        {
            return Err(GitDocError::Config(format!(
                "llm.api_key is required for {} provider",
                provider_name
            )));
        }

        if self.state.db_path.trim().is_empty() {
            return Err(GitDocError::Config("state.db_path is required".to_string()));
        }

        if self.git.commit_doc_updates
            && !self.git.amend_original
            && !self.git.doc_commit_message.contains(git::HASH_TOKEN)
        {
            return Err(GitDocError::Config(format!(
                "git.doc_commit_message must contain {}",
                git::HASH_TOKEN
            )));
        }

        if self.runtime.default_section.trim().is_empty() {
            self.runtime.default_section = content::DEFAULT_SECTION.to_string();
        }
        if self.llm.timeout_secs == 0 {
            self.llm.timeout_secs = provider::DEFAULT_TIMEOUT_SECS;
        }

        Ok(())
    }
}

/// Lower-cased, trimmed provider name
pub fn normalize_provider(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn is_supported_provider(name: &str) -> bool {
    provider::SUPPORTED.contains(&name)
}

// =============================================================================
// Mapping Rules
// =============================================================================

/// Routes changes whose path contains `code_pattern` (minus `*`) to a doc section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct MappingRule {
    pub code_pattern: String,
    pub doc_file: String,
    pub section: String,
}

impl MappingRule {
    pub fn new(
        code_pattern: impl Into<String>,
        doc_file: impl Into<String>,
        section: impl Into<String>,
    ) -> Self {
        Self {
            code_pattern: code_pattern.into(),
            doc_file: doc_file.into(),
            section: section.into(),
        }
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

/// API keys are never serialized and are redacted in debug output.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Primary provider: mock, openai, anthropic, gemini (google), groq, ollama
    pub provider: String,

    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    pub model: String,

    /// Custom endpoint base URL
    pub api_base: Option<String>,

    /// Request timeout in seconds
    #[serde(rename = "timeout")]
    pub timeout_secs: u64,

    /// Retries per provider after the first attempt
    pub max_retries: u32,

    pub failover_enabled: bool,

    /// Providers tried in order once the primary is exhausted
    pub fallback_providers: Vec<String>,
}

impl LlmConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("failover_enabled", &self.failover_enabled)
            .field("fallback_providers", &self.fallback_providers)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            api_key: None,
            model: provider::DEFAULT_MODEL.to_string(),
            api_base: None,
            timeout_secs: provider::DEFAULT_TIMEOUT_SECS,
            max_retries: chain::DEFAULT_MAX_RETRIES,
            failover_enabled: true,
            fallback_providers: Vec::new(),
        }
    }
}

// =============================================================================
// Git Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Commit rewritten docs at all
    pub commit_doc_updates: bool,

    /// Amend the code commit instead of creating a separate doc commit
    pub amend_original: bool,

    /// Separate doc commit message; `{hash}` is replaced by the code commit
    pub doc_commit_message: String,
}

impl GitConfig {
    pub fn commit_message_for(&self, commit: &str) -> String {
        self.doc_commit_message.replace(git::HASH_TOKEN, commit)
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            commit_doc_updates: true,
            amend_original: false,
            doc_commit_message: git::DEFAULT_COMMIT_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// SQLite path, relative to the repository root unless absolute
    pub db_path: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            db_path: state::DB_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub default_section: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_section: content::DEFAULT_SECTION.to_string(),
        }
    }
}
