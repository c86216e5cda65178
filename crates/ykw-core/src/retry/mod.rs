//! Retry policy for heartbeat delivery.
//!
//! Heartbeats are the platform's only evidence of watching, so delivery is
//! never silently dropped: transport and API-level failures are retried
//! without an attempt limit, with a fixed delay between attempts. Shape
//! errors indicate a remote contract change and are not retried. The policy
//! is a named, configurable value so backoff or circuit-breaking can be
//! introduced later without touching the delivery loop.

mod classify;
mod run;

pub use classify::classify;
pub use run::run_with_retry;

use std::time::Duration;

/// High-level classification of an [`crate::api::ApiError`] for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection/timeout/non-2xx status.
    Transport,
    /// Well-formed response carrying a failure code.
    Api,
    /// Response shape mismatch; retrying cannot help.
    Shape,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Fixed-delay policy with unbounded attempts for retryable kinds.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Delay between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Decide whether to retry. `attempt` is 1-based (1 = first attempt);
    /// unused by the fixed-delay policy but kept so bounded/backoff variants
    /// keep the same signature.
    pub fn decide(&self, _attempt: u32, kind: ErrorKind) -> RetryDecision {
        match kind {
            ErrorKind::Shape => RetryDecision::NoRetry,
            ErrorKind::Transport | ErrorKind::Api => RetryDecision::RetryAfter(self.delay),
        }
    }
}
