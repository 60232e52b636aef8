//! Error types for video providers

use thiserror::Error;

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur while generating a video
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Provider API returned an error status code
    #[error("Provider API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error body returned by the provider
        message: String,
    },

    /// Failed to parse a provider response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The provider finished the prediction without success
    #[error("Prediction {id} {status}: {message}")]
    PredictionFailed {
        id: String,
        status: String,
        message: String,
    },

    /// Writing the downloaded video failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Provider is misconfigured
    #[error("Invalid provider configuration: {0}")]
    InvalidConfig(String),
}

impl ProviderError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}
