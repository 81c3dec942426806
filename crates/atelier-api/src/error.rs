//! Error types for the Atelier API client.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API url: {0}")]
    InvalidUrl(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Http { status: u16, message: Option<String> },

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("not found: {0}")]
    NotFound(String),
}
