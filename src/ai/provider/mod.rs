//! LLM Provider Abstraction
//!
//! Defines the `LlmProvider` trait: a named provider turns a prompt into
//! section text. Concrete providers wrap hosted HTTP APIs, a local Ollama
//! daemon, or a deterministic mock.
//!
//! ## Modules
//!
//! - `resilient`: Retry/backoff and ordered failover across providers
//! - `http`: Shared request plumbing and error classification

mod anthropic;
mod gemini;
mod http;
mod mock;
mod ollama;
mod openai;
mod resilient;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use resilient::ResilientClient;

// Re-export error types from centralized location
pub use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::{LlmConfig, normalize_provider};
use crate::constants::provider as provider_constants;
use crate::types::{GitDocError, Result};

/// Shared LLM provider type
pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Per-provider settings derived from [`LlmConfig`]
///
/// API keys are redacted in debug output; each provider moves the key into a
/// `SecretString` at construction.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Normalized provider name
    pub provider: String,
    /// Model name; blank selects the provider's default
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    pub api_key: Option<String>,
    /// Endpoint override
    pub api_base: Option<String>,
    /// Output token cap for APIs that require one
    pub max_tokens: u32,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl ProviderConfig {
    /// Settings for `provider` taken from the `[llm]` section.
    ///
    /// The endpoint override only applies to the primary provider.
    pub fn for_provider(provider: &str, llm: &LlmConfig) -> Self {
        let provider = normalize_provider(provider);
        let api_base = if provider == normalize_provider(&llm.provider) {
            llm.api_base.clone().filter(|base| !base.trim().is_empty())
        } else {
            None
        };
        Self {
            provider,
            model: llm.model.trim().to_string(),
            timeout_secs: llm.timeout_secs,
            api_key: llm.api_key.clone().filter(|key| !key.trim().is_empty()),
            api_base,
            max_tokens: provider_constants::MAX_OUTPUT_TOKENS,
        }
    }

    pub(crate) fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        if self.model.is_empty() {
            default
        } else {
            &self.model
        }
    }

    pub(crate) fn base_or(&self, default: &str) -> String {
        self.api_base
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }

    pub(crate) fn require_api_key(&self) -> Result<String> {
        self.api_key.clone().ok_or_else(|| {
            GitDocError::Config(format!("llm.api_key is required for {} provider", self.provider))
        })
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            model: String::new(),
            timeout_secs: provider_constants::DEFAULT_TIMEOUT_SECS,
            api_key: None,
            api_base: None,
            max_tokens: provider_constants::MAX_OUTPUT_TOKENS,
        }
    }
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

/// Text generation backend
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name, recorded with cache entries and error context
    fn name(&self) -> &str;

    /// Generate replacement section text for `prompt`.
    ///
    /// Implementations return `GitDocError::Cancelled` once `cancel` fires.
    async fn generate(&self, cancel: &CancellationToken, prompt: &str) -> Result<String>;
}

/// Create a single provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "mock" => Ok(Arc::new(MockProvider::new())),
        "openai" => Ok(Arc::new(OpenAiProvider::openai(config.clone())?)),
        "groq" => Ok(Arc::new(OpenAiProvider::groq(config.clone())?)),
        "anthropic" => Ok(Arc::new(AnthropicProvider::new(config.clone())?)),
        "google" | "gemini" => Ok(Arc::new(GeminiProvider::new(config.clone())?)),
        "ollama" => Ok(Arc::new(OllamaProvider::new(config.clone())?)),
        other => Err(GitDocError::Config(format!("unsupported provider: {}", other))),
    }
}

/// Ordered provider names: the primary (blank means mock), then the
/// fallbacks when failover is enabled, skipping blanks and duplicates.
pub fn provider_names(llm: &LlmConfig) -> Vec<String> {
    let primary = normalize_provider(&llm.provider);
    let mut names = vec![if primary.is_empty() {
        "mock".to_string()
    } else {
        primary
    }];

    if llm.failover_enabled {
        for fallback in &llm.fallback_providers {
            let name = normalize_provider(fallback);
            if name.is_empty() || names.contains(&name) {
                continue;
            }
            names.push(name);
        }
    }
    names
}

/// Build the generation client for a run.
///
/// A single provider without retries is used bare; anything else is wrapped
/// in a [`ResilientClient`].
pub fn build_client(llm: &LlmConfig) -> Result<SharedProvider> {
    let providers = provider_names(llm)
        .iter()
        .map(|name| create_provider(&ProviderConfig::for_provider(name, llm)))
        .collect::<Result<Vec<_>>>()?;

    if let [single] = providers.as_slice()
        && llm.max_retries == 0
    {
        debug!(provider = single.name(), "Using bare provider");
        return Ok(Arc::clone(single));
    }

    let client = ResilientClient::new(providers, llm.max_retries);
    debug!(client = client.name(), max_retries = llm.max_retries, "Using resilient client");
    Ok(Arc::new(client))
}
