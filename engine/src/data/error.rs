//! Error types
//!
//! `DataError` is what collaborators (transport, metadata service) report.
//! `EngineError` is the taxonomy surfaced by the engine itself; every
//! variant renders to a human-readable message.

use thiserror::Error;

/// Failure reported by a collaborator call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// Service answered with an error status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Request never completed (connection reset, timeout, DNS, ...)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Target record or collection does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

impl DataError {
    /// Create an HTTP status error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Check if a retry of the same call could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::NotFound(_) | Self::Decode(_) | Self::Other(_) => false,
        }
    }
}

/// Engine-level error taxonomy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Request is incomplete (missing entity or filter) - nothing was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity name could not be resolved to a collection
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// A single fetch or write failed
    #[error("Network error: {message}")]
    Network { message: String, retryable: bool },

    /// One item inside a batch failed
    #[error("Operation {index} failed: {message}")]
    Operation { index: usize, message: String },

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// A page fetch failed; prior state is intact so the caller may retry
    pub fn retryable(source: &DataError) -> Self {
        Self::Network {
            message: source.to_string(),
            retryable: true,
        }
    }

    /// Whether the failed step can be attempted again as-is
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { retryable: true, .. })
    }

    /// Message suitable for a toast or status line
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::Resolution(msg) | Self::Config(msg) => msg.clone(),
            Self::Network { message, retryable } => {
                if *retryable {
                    format!("{} (you can retry)", message)
                } else {
                    message.clone()
                }
            }
            Self::Operation { index, message } => format!("Item {}: {}", index, message),
        }
    }
}

impl From<DataError> for EngineError {
    fn from(e: DataError) -> Self {
        Self::Network {
            retryable: e.is_transient(),
            message: e.to_string(),
        }
    }
}
