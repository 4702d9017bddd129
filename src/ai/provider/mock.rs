//! Deterministic offline provider

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::LlmProvider;
use crate::constants::provider::MOCK_PROMPT_PREFIX_CHARS;
use crate::types::{GitDocError, Result};

/// Echoes the start of the prompt as a bullet; needs no network or key.
#[derive(Debug, Default, Clone)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, cancel: &CancellationToken, prompt: &str) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(GitDocError::Cancelled);
        }

        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Ok("No changes detected.".to_string());
        }

        let prefix: String = prompt.chars().take(MOCK_PROMPT_PREFIX_CHARS).collect();
        Ok(format!("- Auto-generated update\n\n{}", prefix))
    }
}
