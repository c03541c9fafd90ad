//! Error Types

use thiserror::Error;

/// Result type alias for payments-client operations
pub type Result<T> = std::result::Result<T, CarnilError>;

/// Errors raised by a payments client.
///
/// Adapters never inspect the variant: any `CarnilError` becomes a 500 with
/// the error's display string as the message.
#[derive(Error, Debug)]
pub enum CarnilError {
    /// The provider rejected or failed the operation
    #[error("{0}")]
    Provider(String),

    /// Transport failure talking to a remote Carnil endpoint
    #[cfg(feature = "remote")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A remote endpoint answered with a non-success status
    #[error("{message} (status {status})")]
    Status { status: u16, message: String },

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors decoding an inbound `{action, ...params}` body.
#[derive(Error, Debug)]
pub enum ActionError {
    /// `action` missing or not one of the known names
    #[error("Unknown action: {0}")]
    Unknown(String),

    /// Body is not valid JSON
    #[error("{0}")]
    Malformed(serde_json::Error),

    /// Known action whose params do not match the method signature
    #[error("Invalid params for {action}: {source}")]
    Params {
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
