//! Ollama Local LLM Provider
//!
//! Non-streaming `/api/generate` against a locally-running Ollama daemon.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::http::{build_client, require_text, send_json};
use super::{LlmProvider, ProviderConfig};
use crate::types::{ErrorCategory, GitDocError, Result};

const DEFAULT_API_BASE: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3:latest";

/// Ollama Local LLM Provider
#[derive(Debug)]
pub struct OllamaProvider {
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        // Validate endpoint URL for security (SSRF prevention)
        let api_base = Self::validate_endpoint(&api_base)?;

        Ok(Self {
            api_base,
            model: config.model_or(DEFAULT_MODEL).to_string(),
            client: build_client(config.timeout_secs)?,
        })
    }

    /// Only http/https endpoints are accepted; non-local hosts are logged.
    fn validate_endpoint(endpoint: &str) -> Result<String> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            GitDocError::Config(format!("Invalid Ollama endpoint URL '{}': {}", endpoint, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(GitDocError::Config(format!(
                "Ollama endpoint must use http or https scheme, got: {}",
                url.scheme()
            )));
        }

        if let Some(host) = url.host_str()
            && !matches!(host, "localhost" | "127.0.0.1" | "::1" | "[::1]")
        {
            warn!(
                "Ollama endpoint is not localhost: {}. Ensure this is intentional.",
                host
            );
        }

        Ok(url.as_str().trim_end_matches('/').to_string())
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, cancel: &CancellationToken, prompt: &str) -> Result<String> {
        debug!(provider = "ollama", model = %self.model, "Sending generate request");

        let body = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        let request = self
            .client
            .post(format!("{}/api/generate", self.api_base))
            .json(&body);

        let response: OllamaResponse = send_json("ollama", cancel, request)
            .await
            .map_err(|err| match err {
                GitDocError::Llm(mut e) if e.category == ErrorCategory::Network => {
                    e.message = format!(
                        "{} (is Ollama running at {}? Start with: ollama serve)",
                        e.message, self.api_base
                    );
                    GitDocError::Llm(e)
                }
                other => other,
            })?;
        require_text("ollama", Some(&response.response), "text")
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}
