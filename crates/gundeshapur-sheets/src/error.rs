//! Sheets error types and handling

use gundeshapur_common::LibraryError;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while talking to the remote spreadsheet store
#[derive(Error, Debug)]
pub enum SheetsError {
    /// Invalid request configuration
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A1 address that does not parse
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Non-2xx answer from the store, with the upstream message
    #[error("{message} (status {status})")]
    Remote { status: u16, message: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(String),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type for store operations
pub type SheetsResult<T> = Result<T, SheetsError>;

/// Error category for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetsErrorCategory {
    /// Connection-related errors (DNS, TCP, TLS)
    Connection,
    Timeout,
    /// Invalid request construction
    Request,
    /// Authentication or permission rejected (401/403)
    Authorization,
    /// The handle or tab does not exist (404, or 400 "Unable to parse range")
    NotFound,
    /// Any other status or body problem
    Response,
    Unknown,
}

impl SheetsError {
    /// Categorize the error for reporting
    pub fn category(&self) -> SheetsErrorCategory {
        match self {
            SheetsError::InvalidRequest(_)
            | SheetsError::InvalidRange(_)
            | SheetsError::UrlParse(_) => SheetsErrorCategory::Request,
            SheetsError::Remote { status, message } => match status {
                401 | 403 => SheetsErrorCategory::Authorization,
                404 => SheetsErrorCategory::NotFound,
                400 if message.starts_with("Unable to parse range") => {
                    SheetsErrorCategory::NotFound
                }
                _ => SheetsErrorCategory::Response,
            },
            SheetsError::Json(_) => SheetsErrorCategory::Response,
            SheetsError::Reqwest(e) => {
                if e.is_connect() {
                    SheetsErrorCategory::Connection
                } else if e.is_timeout() {
                    SheetsErrorCategory::Timeout
                } else if e.is_request() || e.is_builder() {
                    SheetsErrorCategory::Request
                } else {
                    SheetsErrorCategory::Unknown
                }
            }
        }
    }

    /// The message reported by the store, when there is one
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            SheetsError::Remote { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Sanitize error message (remove credentials, tokens and API keys)
    pub fn sanitized_message(&self) -> String {
        sanitize_error_message(&self.to_string())
    }

    /// Build a `Remote` error from a failed response body.
    ///
    /// Google wraps failures as `{"error": {"code", "message", "status"}}`; anything else
    /// falls back to the raw body text.
    pub fn from_response_body(status: u16, body: &[u8]) -> Self {
        #[derive(Deserialize)]
        struct Envelope {
            error: ErrorBody,
        }

        #[derive(Deserialize)]
        struct ErrorBody {
            #[serde(default)]
            message: String,
        }

        let message = match serde_json::from_slice::<Envelope>(body) {
            Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
            _ => {
                let text = String::from_utf8_lossy(body).trim().to_string();
                if text.is_empty() {
                    format!("HTTP status {}", status)
                } else {
                    text
                }
            }
        };

        SheetsError::Remote { status, message }
    }
}

impl From<serde_json::Error> for SheetsError {
    fn from(err: serde_json::Error) -> Self {
        SheetsError::Json(err.to_string())
    }
}

impl From<SheetsError> for LibraryError {
    fn from(err: SheetsError) -> Self {
        match err.category() {
            SheetsErrorCategory::Connection => LibraryError::Connection(err.sanitized_message()),
            SheetsErrorCategory::Timeout => LibraryError::Timeout(err.sanitized_message()),
            _ => match err {
                SheetsError::Remote { message, .. } => LibraryError::RemoteStore(message),
                SheetsError::Json(msg) => LibraryError::Serialization(msg),
                other => LibraryError::RemoteStore(other.sanitized_message()),
            },
        }
    }
}

/// Sanitize error messages by removing sensitive information
fn sanitize_error_message(msg: &str) -> String {
    use regex::Regex;
    use std::sync::OnceLock;

    static URL_CREDS_RE: OnceLock<Regex> = OnceLock::new();
    static KEY_PARAM_RE: OnceLock<Regex> = OnceLock::new();
    static AUTH_HEADER_RE: OnceLock<Regex> = OnceLock::new();

    let url_creds_re = URL_CREDS_RE
        .get_or_init(|| Regex::new(r"https?://[^@:/\s]+:[^@\s]+@").expect("valid regex"));
    let key_param_re = KEY_PARAM_RE.get_or_init(|| {
        Regex::new(r"([?&](?:key|access_token)=)[^&\s)]+").expect("valid regex")
    });
    let auth_header_re = AUTH_HEADER_RE.get_or_init(|| {
        Regex::new(r"(?i)(authorization:\s*bearer|bearer|api[_-]?key|token)\s*[:=]?\s*\S+")
            .expect("valid regex")
    });

    let sanitized = url_creds_re.replace_all(msg, "https://[REDACTED]@");
    let sanitized = key_param_re.replace_all(&sanitized, "${1}[REDACTED]");
    let sanitized = auth_header_re.replace_all(&sanitized, "$1: [REDACTED]");

    sanitized.to_string()
}
