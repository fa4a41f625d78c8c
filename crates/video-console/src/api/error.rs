//! Normalized failures of the backend client.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Every failure a backend call can produce, reduced to a user-facing message
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Client Error: could not connect to server ({0})")]
    Connection(String),

    #[error("Server Error (Code: {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Client Error: {0}")]
    Request(String),

    #[error("Client Error: unexpected response body ({0})")]
    Decode(String),

    #[error("Client Error: cannot read {path}: {reason}")]
    File { path: String, reason: String },
}

impl ApiError {
    /// HTTP status of a server-side failure
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }

    /// Classify a failure that happened before a response was received
    pub(crate) fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ApiError::Connection(err.to_string())
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Request(err.to_string())
        }
    }

    /// Build the error for a non-2xx response.
    ///
    /// The message is the body's `detail` field when present, otherwise the
    /// status reason phrase.
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        let detail = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| value.get("detail").cloned())
            .and_then(|detail| match detail {
                Value::Null => None,
                Value::String(text) if text.is_empty() => None,
                Value::String(text) => Some(text),
                other => Some(other.to_string()),
            });

        let message = detail.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

        ApiError::Server {
            status: status.as_u16(),
            message,
        }
    }
}
