//! Error Handling Module
//!
//! `RelayError` covers every failure the relay can observe, from startup
//! configuration through upstream streaming. Errors found before a client
//! stream is opened become HTTP responses (see the `IntoResponse` impl);
//! errors found after that are injected into the stream as error events.
//!
//! # Example
//!
//! ```rust
//! use chat_relay::error::{ErrorCategory, RelayError};
//!
//! let error = RelayError::InvalidInput("messages must not be empty".into());
//! assert_eq!(error.category(), ErrorCategory::Validation);
//! assert_eq!(error.status_code(), 400);
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Relay error type
#[derive(Error, Debug)]
pub enum RelayError {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Upstream credential absent from configuration
    #[error("Missing API key: {0}")]
    MissingApiKey(String),

    /// Caller input failed structural validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Upstream rejected the relay's credential
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Upstream rate limit hit
    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    /// Upstream quota exhausted
    #[error("Quota exceeded: {0}")]
    QuotaExceededError(String),

    /// Upstream returned a non-success status that maps to nothing more specific
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Transport failure talking to upstream
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Failure while reading an already-open upstream stream
    #[error("Stream error: {0}")]
    StreamError(String),

    /// Payload could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Upstream did not answer in time
    #[error("Timeout: {0}")]
    TimeoutError(String),
}

/// Coarse grouping of errors, used for logging and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Validation,
    Upstream,
    Transport,
    Timeout,
    Parse,
}

impl RelayError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigurationError(_) | Self::MissingApiKey(_) => ErrorCategory::Configuration,
            Self::InvalidInput(_) => ErrorCategory::Validation,
            Self::AuthenticationError(_)
            | Self::RateLimitError(_)
            | Self::QuotaExceededError(_)
            | Self::ApiError { .. } => ErrorCategory::Upstream,
            Self::HttpError(_) | Self::StreamError(_) => ErrorCategory::Transport,
            Self::TimeoutError(_) => ErrorCategory::Timeout,
            Self::ParseError(_) => ErrorCategory::Parse,
        }
    }

    /// HTTP status used when this error is returned before any stream is opened.
    ///
    /// Upstream auth failures become `502`: the caller's own credentials are
    /// not what failed.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::RateLimitError(_) | Self::QuotaExceededError(_) => 429,
            Self::TimeoutError(_) => 504,
            Self::ConfigurationError(_) | Self::MissingApiKey(_) => 500,
            Self::AuthenticationError(_)
            | Self::ApiError { .. }
            | Self::HttpError(_)
            | Self::StreamError(_)
            | Self::ParseError(_) => 502,
        }
    }

    /// Message safe to show to the browser client.
    pub fn user_message(&self) -> String {
        match self {
            Self::ConfigurationError(_) | Self::MissingApiKey(_) => {
                "relay is misconfigured".to_string()
            }
            Self::InvalidInput(msg) => msg.clone(),
            Self::AuthenticationError(_) => "upstream provider rejected credentials".to_string(),
            Self::RateLimitError(msg) | Self::QuotaExceededError(msg) => msg.clone(),
            Self::ApiError { message, .. } => message.clone(),
            Self::HttpError(_) => "could not reach upstream provider".to_string(),
            Self::StreamError(_) => "upstream connection lost".to_string(),
            Self::ParseError(msg) => msg.clone(),
            Self::TimeoutError(msg) => msg.clone(),
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TimeoutError(format!("upstream request timed out: {err}"))
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match self.category() {
            ErrorCategory::Validation => tracing::debug!(error = %self, "rejected request"),
            _ => tracing::warn!(error = %self, status = status.as_u16(), "relay request failed"),
        }
        let body = serde_json::json!({ "error": self.user_message() });
        (status, Json(body)).into_response()
    }
}

/// Result type used across the crate
pub type Result<T> = std::result::Result<T, RelayError>;
