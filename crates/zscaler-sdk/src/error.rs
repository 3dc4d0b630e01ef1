//! Error types for the Zscaler request/response layer.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.

use serde_json::Value;

use crate::config::api;

/// Errors from the HTTP client layer.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request path could not be joined onto the base URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Retryable status persisted past the retry ceiling
    #[error("Request failed after {attempts} attempts (last status {status}): {body}")]
    RetriesExhausted {
        /// Status of the last response
        status: u16,
        /// Total attempts made, initial call included
        attempts: u32,
        /// Parsed body of the last response, or its text as a JSON string
        body: Value,
    },

    /// Error-shaped response where a successful one was required
    #[error("Unexpected status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },

    /// Successful response whose body is not the expected JSON shape
    #[error("Unexpected response body: {0}")]
    UnexpectedBody(String),
}

impl ClientError {
    /// Create a retries-exhausted error.
    #[must_use]
    pub fn retries_exhausted(status: u16, attempts: u32, body: Value) -> Self {
        Self::RetriesExhausted {
            status,
            attempts,
            body,
        }
    }

    /// Create an error for an error-shaped response.
    #[must_use]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Create an unexpected body error.
    #[must_use]
    pub fn unexpected_body(message: impl Into<String>) -> Self {
        Self::UnexpectedBody(message.into())
    }

    /// Status code carried by this error, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::RetriesExhausted { status, .. } | Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if the status carried by this error is in the retryable set.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Status { status, .. } if is_retryable_status(*status))
    }
}

/// Returns true if `status` warrants an automatic retry.
#[must_use]
pub fn is_retryable_status(status: u16) -> bool {
    api::RETRYABLE_STATUS_CODES.contains(&status)
}

/// Errors from bearer-token decoding and legacy key obfuscation.
#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    /// Token is missing or empty
    #[error("Token is empty")]
    EmptyToken,

    /// Token does not have exactly three dot-separated parts
    #[error("Token has {0} segments, expected 3")]
    MalformedToken(usize),

    /// Payload segment is not valid base64url
    #[error("Token payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Payload segment is not JSON
    #[error("Token payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload is JSON but not an object
    #[error("Token payload is not a JSON object")]
    NotAnObject,

    /// `exp` claim is present but not a number
    #[error("Token exp claim is not numeric: {0}")]
    InvalidExpiry(Value),

    /// Obfuscation seed is too short or not ASCII
    #[error("API key seed must be at least {min} ASCII characters")]
    InvalidSeed {
        /// Minimum seed length
        min: usize,
    },
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
