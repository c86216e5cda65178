//! Retry loop: run an async operation until success or policy says stop.

use std::future::Future;

use crate::api::ApiError;

use super::classify;
use super::{RetryDecision, RetryPolicy};

/// Runs `op` until it succeeds or the policy declines to retry. Sleeps the
/// policy delay between attempts; every sleep is a tokio suspension point, so
/// concurrent sessions keep running.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    mut op: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => match policy.decide(attempt, classify(&e)) {
                RetryDecision::NoRetry => return Err(e),
                RetryDecision::RetryAfter(delay) => {
                    tracing::warn!(what, attempt, error = %e, "attempt failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
            },
        }
    }
}
