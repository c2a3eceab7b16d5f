//! Error types for tracker operations.

use thiserror::Error;

/// Errors that can occur while talking to Bugzilla.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Bug not found (or not visible with the configured credentials).
    #[error("Bug not found: #{0}")]
    NotFound(u64),

    /// Response body could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Response decoded but did not have the expected shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
