//! Retry and Failover Client
//!
//! Wraps an ordered provider list as a single provider.
//!
//! ## Strategy
//!
//! 1. Try the current provider up to `max_retries + 1` times
//! 2. Between attempts on the same provider wait `base * 2^attempt`
//! 3. Once a provider is exhausted, move on to the next one
//! 4. Stop immediately when the run is cancelled

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::{LlmProvider, SharedProvider};
use crate::ai::cancel::sleep_or_cancel;
use crate::constants::chain as chain_constants;
use crate::types::{GitDocError, Result};

pub struct ResilientClient {
    providers: Vec<SharedProvider>,
    max_retries: u32,
    base_delay: Duration,
    name: String,
}

impl ResilientClient {
    pub fn new(providers: Vec<SharedProvider>, max_retries: u32) -> Self {
        let name = format!(
            "resilient({})",
            providers
                .iter()
                .map(|p| p.name())
                .collect::<Vec<_>>()
                .join("->")
        );
        Self {
            providers,
            max_retries,
            base_delay: Duration::from_millis(chain_constants::BASE_DELAY_MS),
            name,
        }
    }

    /// Override the backoff base delay
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
    }
}

#[async_trait]
impl LlmProvider for ResilientClient {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, cancel, prompt), fields(providers = self.providers.len()))]
    async fn generate(&self, cancel: &CancellationToken, prompt: &str) -> Result<String> {
        if self.providers.is_empty() {
            return Err(GitDocError::LlmApi("no llm providers configured".to_string()));
        }

        let mut last_error: Option<GitDocError> = None;

        for provider in &self.providers {
            let provider_name = provider.name();

            for attempt in 0..=self.max_retries {
                if cancel.is_cancelled() {
                    return Err(GitDocError::Cancelled);
                }

                debug!(
                    provider = provider_name,
                    attempt = attempt + 1,
                    max_attempts = self.max_retries + 1,
                    "Generation attempt"
                );

                match provider.generate(cancel, prompt).await {
                    Ok(text) => {
                        if attempt > 0 || last_error.is_some() {
                            info!(
                                provider = provider_name,
                                attempt = attempt + 1,
                                "Generation recovered"
                            );
                        }
                        return Ok(text);
                    }
                    Err(err) if err.is_cancelled() => return Err(err),
                    Err(err) => {
                        warn!(
                            provider = provider_name,
                            attempt = attempt + 1,
                            error = %err,
                            "Generation attempt failed"
                        );
                        last_error = Some(GitDocError::generation(provider_name, attempt + 1, err));
                    }
                }

                if attempt < self.max_retries {
                    sleep_or_cancel(cancel, self.backoff(attempt)).await?;
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| GitDocError::LlmApi("all llm providers failed".to_string())))
    }
}
