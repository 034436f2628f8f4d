//! Error types for the huddle-core crate.

use huddle_client::ClientError;
use huddle_session::SessionError;

/// Core error type for huddle.
#[derive(Debug, thiserror::Error)]
pub enum HuddleError {
    /// Backend request failed or returned unusable data
    #[error("Backend error: {0}")]
    Client(#[from] ClientError),

    /// Session cache misuse
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// An operation needed an open session
    #[error("No active session")]
    NoActiveSession,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
