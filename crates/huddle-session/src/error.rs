//! Error types for the huddle-session crate.

/// Errors that can occur in session cache operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A snapshot was restored into a session other than the one it captured.
    #[error("Snapshot of session '{found}' cannot be restored into '{expected}'")]
    SnapshotMismatch { expected: String, found: String },
}
