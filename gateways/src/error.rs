//! Error types for the payment gateway clients

use thiserror::Error;

/// Errors that can occur when talking to a payment gateway
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Gateway credentials were not configured
    #[error("Missing credentials for {0} gateway")]
    MissingCredentials(&'static str),

    /// HTTP request failed before a response was received
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response parsing failed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Rate limited - too many requests
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// Unauthorized - invalid credentials
    #[error("Unauthorized - invalid gateway credentials")]
    Unauthorized,

    /// The payment was declined by the gateway or issuer
    #[error("Payment declined: {0}")]
    Declined(String),

    /// Gateway returned an error
    #[error("Gateway error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the gateway
        message: String,
    },
}

impl GatewayError {
    /// Short label used in metrics and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredentials(_) => "missing_credentials",
            Self::RequestFailed(_) => "request_failed",
            Self::ResponseParseFailed(_) => "parse_failed",
            Self::RateLimited => "rate_limited",
            Self::Unauthorized => "unauthorized",
            Self::Declined(_) => "declined",
            Self::ApiError { .. } => "api_error",
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err.to_string())
    }
}
