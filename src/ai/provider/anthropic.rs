//! Anthropic Messages API Provider

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::http::{build_client, require_text, send_json};
use super::{LlmProvider, ProviderConfig};
use crate::types::Result;

const DEFAULT_API_BASE: &str = "https://api.anthropic.com/v1";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    api_key: SecretString,
    api_base: String,
    model: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key = config.require_api_key()?;
        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base: config.base_or(DEFAULT_API_BASE),
            model: config.model_or(DEFAULT_MODEL).to_string(),
            max_tokens: config.max_tokens,
            client: build_client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, cancel: &CancellationToken, prompt: &str) -> Result<String> {
        debug!(provider = "anthropic", model = %self.model, "Sending messages request");

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };
        let request = self
            .client
            .post(format!("{}/messages", self.api_base))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&body);

        let response: MessagesResponse = send_json("anthropic", cancel, request).await?;
        let text = response
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .find(|text| !text.trim().is_empty());
        require_text("anthropic", text, "text content")
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::super::http::test_server::CannedServer;
    use super::*;
    use crate::types::ErrorCategory;

    fn config(base: &str) -> ProviderConfig {
        ProviderConfig {
            provider: "anthropic".into(),
            api_key: Some("ak-test".into()),
            api_base: Some(base.to_string()),
            ..ProviderConfig::default()
        }
    }

    #[tokio::test]
    async fn test_generate_skips_blank_and_non_text_blocks() {
        let server = CannedServer::start(
            200,
            r#"{"content":[{"type":"tool_use","id":"x"},{"type":"text","text":"  "},{"type":"text","text":"Section body\n"}]}"#,
        )
        .await;
        let provider = AnthropicProvider::new(config(&server.base_url)).unwrap();

        let text = provider
            .generate(&CancellationToken::new(), "hello")
            .await
            .unwrap();
        assert_eq!(text, "Section body");

        let request = server.request().await.to_lowercase();
        assert!(request.starts_with("post /messages"));
        assert!(request.contains("x-api-key: ak-test"));
        assert!(request.contains("anthropic-version: 2023-06-01"));
        assert!(request.contains(r#""max_tokens":1024"#));
    }

    #[tokio::test]
    async fn test_generate_without_text_fails() {
        let server = CannedServer::start(200, r#"{"content":[]}"#).await;
        let provider = AnthropicProvider::new(config(&server.base_url)).unwrap();

        let err = provider
            .generate(&CancellationToken::new(), "hello")
            .await
            .unwrap_err();
        assert_eq!(err.category(), Some(ErrorCategory::ParseError));
        assert!(err.to_string().contains("anthropic response has no text content"));
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = CannedServer::start(529, r#"{"type":"error"}"#).await;
        let provider = AnthropicProvider::new(config(&server.base_url)).unwrap();

        let err = provider
            .generate(&CancellationToken::new(), "hello")
            .await
            .unwrap_err();
        assert_eq!(err.category(), Some(ErrorCategory::Transient));
    }
}
