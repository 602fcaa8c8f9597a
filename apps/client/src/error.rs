//! Error types for the sync client.

use thiserror::Error;

/// Result type alias using SyncError.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Failures of a gateway call or of the mutation that issued it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Word not found: {0}")]
    NotFound(String),

    #[error("Mutation task aborted: {0}")]
    Aborted(String),
}
