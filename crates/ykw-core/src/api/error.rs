//! API error taxonomy for retry classification.
//!
//! Distinguishes transport failures, non-success HTTP statuses, API-level
//! failure envelopes (code + message), and protocol/shape mismatches so the
//! retry policy can branch on kind instead of matching error text.

use thiserror::Error;

/// Error returned by any remote platform call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection/timeout/body-read failure from the HTTP client.
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response arrived but with a non-2xx status.
    #[error("HTTP {0}")]
    Status(u16),

    /// Well-formed response carrying a failure code/message ("API said no").
    #[error("api error (code {code}): {message}")]
    Api { code: i64, message: String },

    /// Response is missing an expected field or is not the expected shape.
    /// Indicates an incompatible remote contract change; not retried.
    #[error("response shape: {0}")]
    Shape(String),
}

impl ApiError {
    /// Build an API-level error from an optional code and message.
    pub fn api(code: Option<i64>, message: Option<String>) -> Self {
        ApiError::Api {
            code: code.unwrap_or(-1),
            message: message.unwrap_or_else(|| "unknown error".to_string()),
        }
    }
}
