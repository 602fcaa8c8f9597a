//! Error types for word-core.

use thiserror::Error;

/// Result type alias using CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while interpreting domain values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown status code: {0}")]
    UnknownStatus(String),

    #[error("invalid word id: {0}")]
    InvalidId(String),
}
