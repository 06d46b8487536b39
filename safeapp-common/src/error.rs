//! Common error types for SafeApp

use thiserror::Error;

/// Common result type for SafeApp operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the dashboard crates
#[derive(Error, Debug)]
pub enum Error {
    /// Webhook unreachable or answered with a non-success status
    #[error("Transport error on {endpoint}: {message}")]
    Transport {
        endpoint: String,
        /// HTTP status when the endpoint answered, None when unreachable
        status: Option<u16>,
        message: String,
    },

    /// Required field missing before persistence
    #[error("Validation error: {0}")]
    Validation(String),

    /// Microphone access denied
    #[error("Permission denied: {0}")]
    Permission(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation not allowed in the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Payload could not be decoded into a domain value
    #[error("Decode error: {0}")]
    Decode(String),
}

impl Error {
    /// Build a transport error for an endpoint that could not be reached
    pub fn unreachable(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Error::Transport {
            endpoint: endpoint.into(),
            status: None,
            message: message.to_string(),
        }
    }

    /// Build a transport error for a non-success HTTP status
    pub fn status(endpoint: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = if body.trim().is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, body.trim())
        };
        Error::Transport {
            endpoint: endpoint.into(),
            status: Some(status),
            message,
        }
    }

    /// True for failures of the remote call itself
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }
}
