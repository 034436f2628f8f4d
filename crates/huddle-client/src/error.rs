//! Error types for the huddle-client crate.

/// Errors that can occur talking to a chat backend.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Base URL is not usable
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Backend returned a message that violates the attribution rules
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
