//! OpenAI-compatible Chat Completions Provider
//!
//! Serves both OpenAI and Groq, which exposes the same API under its own base URL.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::http::{build_client, require_text, send_json};
use super::{LlmProvider, ProviderConfig};
use crate::types::Result;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
const GROQ_DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Chat Completions provider with secure API key handling
pub struct OpenAiProvider {
    name: &'static str,
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("name", &self.name)
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn openai(config: ProviderConfig) -> Result<Self> {
        Self::build("openai", OPENAI_API_BASE, OPENAI_DEFAULT_MODEL, config)
    }

    pub fn groq(config: ProviderConfig) -> Result<Self> {
        Self::build("groq", GROQ_API_BASE, GROQ_DEFAULT_MODEL, config)
    }

    fn build(
        name: &'static str,
        default_base: &str,
        default_model: &str,
        config: ProviderConfig,
    ) -> Result<Self> {
        let api_key = config.require_api_key()?;
        Ok(Self {
            name,
            api_key: SecretString::from(api_key),
            api_base: config.base_or(default_base),
            model: config.model_or(default_model).to_string(),
            client: build_client(config.timeout_secs)?,
        })
    }

    fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate(&self, cancel: &CancellationToken, prompt: &str) -> Result<String> {
        debug!(provider = self.name, model = %self.model, "Sending chat completion request");

        let url = format!("{}/chat/completions", self.api_base);
        let request = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&self.build_request(prompt));

        let response: ChatCompletionResponse = send_json(self.name, cancel, request).await?;
        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref());
        require_text(self.name, content, "choices")
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
