//! Error types for the Notion internal-API client.

use thiserror::Error;

/// Result type for Notion client operations.
pub type Result<T> = std::result::Result<T, NotionError>;

/// Notion client errors.
#[derive(Debug, Error)]
pub enum NotionError {
    /// Transport-level failure (connection refused, TLS, body decode)
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-2xx response from the API
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response parsed but did not hold the expected structure
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(&'static str),
}
