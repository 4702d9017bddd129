//! Google Gemini generateContent Provider

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::http::{build_client, require_text, send_json};
use super::{LlmProvider, ProviderConfig};
use crate::types::{GitDocError, Result};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

pub struct GeminiProvider {
    api_key: SecretString,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key = config.require_api_key()?;
        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base: config.base_or(DEFAULT_API_BASE),
            model: config.model_or(DEFAULT_MODEL).to_string(),
            client: build_client(config.timeout_secs)?,
        })
    }

    /// `{base}/{model}:generateContent`; the key travels in `x-goog-api-key`
    fn endpoint(&self) -> Result<url::Url> {
        let raw = format!("{}/{}:generateContent", self.api_base, self.model);
        url::Url::parse(&raw)
            .map_err(|e| GitDocError::Config(format!("Invalid Gemini endpoint '{}': {}", raw, e)))
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, cancel: &CancellationToken, prompt: &str) -> Result<String> {
        debug!(provider = "gemini", model = %self.model, "Sending generateContent request");

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };
        let request = self
            .client
            .post(self.endpoint()?)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body);

        let response: GenerateResponse = send_json("gemini", cancel, request).await?;
        let text = response
            .candidates
            .iter()
            .flat_map(|candidate| candidate.content.parts.iter())
            .filter_map(|part| part.text.as_deref())
            .find(|text| !text.trim().is_empty());
        require_text("gemini", text, "text content")
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}
