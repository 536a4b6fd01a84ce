//! Error types for the Gundeshapur library

use thiserror::Error;

/// Result type alias for library operations
pub type Result<T> = std::result::Result<T, LibraryError>;

/// Unified error type for all library operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LibraryError {
    /// Required configuration (credentials, admin email, spreadsheet) is missing
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The remote store rejected the call; carries the upstream message
    #[error("Remote store error: {0}")]
    RemoteStore(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    /// A precondition checked on the client failed
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse classification of a [`LibraryError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Blocks initialization until the user supplies configuration
    Configuration,
    /// Transport or authorization failure reported by the remote store
    Remote,
    /// Rejected before any write was attempted
    Validation,
}

impl LibraryError {
    /// Categorize the error for reporting
    pub fn category(&self) -> ErrorCategory {
        match self {
            LibraryError::Configuration(_) => ErrorCategory::Configuration,
            LibraryError::RemoteStore(_)
            | LibraryError::Connection(_)
            | LibraryError::Timeout(_)
            | LibraryError::Serialization(_) => ErrorCategory::Remote,
            LibraryError::Validation(_)
            | LibraryError::AccessDenied(_)
            | LibraryError::NotFound(_) => ErrorCategory::Validation,
        }
    }

    /// Human-readable message for an interactive screen.
    ///
    /// Nothing here is fatal; every message leaves the user free to retry.
    pub fn user_message(&self) -> String {
        match self {
            LibraryError::RemoteStore(msg) => format!(
                "Error from Google: {}. Please verify your Spreadsheet ID and permissions.",
                msg.trim_end_matches('.')
            ),
            LibraryError::Configuration(msg) => format!(
                "{} Please complete the setup first.",
                ensure_sentence(msg)
            ),
            LibraryError::Connection(msg) | LibraryError::Timeout(msg) => format!(
                "Could not reach Google: {}. Please check your connection and try again.",
                msg.trim_end_matches('.')
            ),
            LibraryError::Validation(msg)
            | LibraryError::AccessDenied(msg)
            | LibraryError::NotFound(msg)
            | LibraryError::Serialization(msg) => ensure_sentence(msg),
        }
    }
}

fn ensure_sentence(msg: &str) -> String {
    if msg.ends_with('.') {
        msg.to_string()
    } else {
        format!("{}.", msg)
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(err: serde_json::Error) -> Self {
        LibraryError::Serialization(err.to_string())
    }
}
