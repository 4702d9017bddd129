//! Cancellation helpers
//!
//! Every long-running step (provider requests, retry backoff) races against
//! the run's `CancellationToken` so a Ctrl-C stops the run at the next await.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::types::{GitDocError, Result};

/// Run `future` unless `cancel` fires first.
///
/// An already-cancelled token short-circuits without polling the future.
pub async fn with_cancellation<T, F>(cancel: &CancellationToken, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(GitDocError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(GitDocError::Cancelled),
        result = future => result,
    }
}

/// Sleep for `delay`, waking early with `Cancelled` if the token fires.
pub async fn sleep_or_cancel(cancel: &CancellationToken, delay: Duration) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(GitDocError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
