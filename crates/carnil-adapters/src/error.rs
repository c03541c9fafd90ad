//! Adapter Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Adapter setup and identification errors
#[derive(Error, Debug)]
pub enum AdapterError {
    /// A configured response header is not a valid HTTP header
    #[error("Invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The caller's identification callback failed
    #[error("{0}")]
    Identify(String),
}
