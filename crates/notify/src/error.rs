//! Error types for the chat client.

use thiserror::Error;

/// Errors that can occur when delivering a message.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Channel is not configured
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Rate limited by the service
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Slack answered with `ok: false`
    #[error("Slack {method} failed: {error}")]
    Api { method: String, error: String },

    /// Other error
    #[error("{0}")]
    Other(String),
}
