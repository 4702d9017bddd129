//! Shared HTTP plumbing for hosted providers

use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::ai::cancel::with_cancellation;
use crate::types::{ErrorCategory, ErrorClassifier, GitDocError, LlmError, Result};

pub(super) fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| GitDocError::LlmApi(format!("Failed to create HTTP client: {}", e)))
}

/// Send `request` and decode a JSON body.
///
/// Non-2xx responses become classified [`LlmError`]s carrying the body.
pub(super) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    cancel: &CancellationToken,
    request: reqwest::RequestBuilder,
) -> Result<T> {
    with_cancellation(cancel, fetch_json(provider, request)).await
}

async fn fetch_json<T: DeserializeOwned>(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| ErrorClassifier::classify_transport(e, provider))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ErrorClassifier::classify_transport(e, provider))?;
    debug!(provider, status = status.as_u16(), bytes = body.len(), "Provider response");

    if !status.is_success() {
        return Err(ErrorClassifier::classify_http_status(
            status.as_u16(),
            &format!("{} request failed: {}", provider, body.trim()),
            provider,
        )
        .into());
    }

    serde_json::from_str(&body).map_err(|e| {
        LlmError::with_provider(
            ErrorCategory::ParseError,
            format!("failed to parse {} response: {}", provider, e),
            provider,
        )
        .into()
    })
}

/// Trimmed text, or a parse error naming what was missing.
pub(super) fn require_text(provider: &str, text: Option<&str>, missing: &str) -> Result<String> {
    match text.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(LlmError::with_provider(
            ErrorCategory::ParseError,
            format!("{} response has no {}", provider, missing),
            provider,
        )
        .into()),
    }
}
