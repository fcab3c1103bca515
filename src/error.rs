//! Error types for inbox-insight, one enum per concern.

use std::time::Duration;

/// Mail provider errors.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Raw message lacks a minimally parseable structure.
    ///
    /// Recoverable per message: the caller skips the message and
    /// continues with the rest of the batch.
    #[error("Malformed message {id}: {reason}")]
    MalformedMessage { id: String, reason: String },

    #[error("Provider listing failed: {0}")]
    ListFailed(String),

    #[error("Provider fetch failed for message {id}: {reason}")]
    FetchFailed { id: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(String),
}

/// Text-generation provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Analysis errors.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Caller requested a method tag this crate does not recognize.
    /// Fatal to the request, surfaced before any external call.
    #[error("Unsupported analysis method: {0}")]
    UnsupportedMethod(String),

    /// The generative endpoint failed at the transport/quota level.
    #[error("Generation service failed: {0}")]
    Generation(#[from] LlmError),
}

/// Pipeline request errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid lookback window: {days} (must be 1-365 days)")]
    InvalidLookback { days: i64 },
}
