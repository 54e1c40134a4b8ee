//! Error types for the Z.AI search client
//!
//! The request path only ever produces the closed set of failures below.
//! Every variant carries a message, and the upstream-facing ones also carry
//! the HTTP status code and parsed error body when one was available.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// The main error type for the search client
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============================================================================
    // Credential Errors
    // ============================================================================
    #[error("Missing API credential: {message}")]
    MissingCredential { message: String },

    #[error("Invalid API credential format: {message}")]
    InvalidCredentialFormat { message: String },

    // ============================================================================
    // Upstream Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Authentication {
        message: String,
        status_code: Option<u16>,
        response_data: Option<Value>,
    },

    #[error("Invalid request: {message}")]
    InvalidRequest {
        message: String,
        status_code: Option<u16>,
        response_data: Option<Value>,
    },

    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded {
        message: String,
        status_code: Option<u16>,
        response_data: Option<Value>,
        retry_after: Option<Duration>,
    },

    #[error("Server error: {message}")]
    Server {
        message: String,
        status_code: Option<u16>,
        response_data: Option<Value>,
    },

    #[error("API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
        response_data: Option<Value>,
    },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingCredential,
    InvalidCredentialFormat,
    AuthenticationFailure,
    InvalidRequest,
    RateLimitExceeded,
    ServerFailure,
    ApiFailure,
    Config,
}

impl Error {
    /// Create a missing credential error
    pub fn missing_credential(message: impl Into<String>) -> Self {
        Self::MissingCredential {
            message: message.into(),
        }
    }

    /// Create an invalid credential format error
    pub fn invalid_credential(message: impl Into<String>) -> Self {
        Self::InvalidCredentialFormat {
            message: message.into(),
        }
    }

    /// Create a local validation error (no status, no body)
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            status_code: None,
            response_data: None,
        }
    }

    /// Create a generic API error without upstream details
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            status_code: None,
            response_data: None,
        }
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingCredential { .. } => ErrorKind::MissingCredential,
            Error::InvalidCredentialFormat { .. } => ErrorKind::InvalidCredentialFormat,
            Error::Authentication { .. } => ErrorKind::AuthenticationFailure,
            Error::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            Error::RateLimitExceeded { .. } => ErrorKind::RateLimitExceeded,
            Error::Server { .. } => ErrorKind::ServerFailure,
            Error::Api { .. } | Error::MalformedResponse { .. } => ErrorKind::ApiFailure,
            Error::Config { .. } => ErrorKind::Config,
        }
    }

    /// Check if retrying the same request could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::RateLimitExceeded | ErrorKind::ServerFailure | ErrorKind::ApiFailure
        )
    }

    /// The error message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            Error::MissingCredential { message }
            | Error::InvalidCredentialFormat { message }
            | Error::Authentication { message, .. }
            | Error::InvalidRequest { message, .. }
            | Error::RateLimitExceeded { message, .. }
            | Error::Server { message, .. }
            | Error::Api { message, .. }
            | Error::MalformedResponse { message }
            | Error::Config { message } => message,
        }
    }

    /// HTTP status code of the upstream response, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Authentication { status_code, .. }
            | Error::InvalidRequest { status_code, .. }
            | Error::RateLimitExceeded { status_code, .. }
            | Error::Server { status_code, .. }
            | Error::Api { status_code, .. } => *status_code,
            _ => None,
        }
    }

    /// Parsed error body of the upstream response, if any
    pub fn response_data(&self) -> Option<&Value> {
        match self {
            Error::Authentication { response_data, .. }
            | Error::InvalidRequest { response_data, .. }
            | Error::RateLimitExceeded { response_data, .. }
            | Error::Server { response_data, .. }
            | Error::Api { response_data, .. } => response_data.as_ref(),
            _ => None,
        }
    }

    /// Server-specified delay before the next attempt (429 only)
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimitExceeded { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Result type alias for the search client
pub type Result<T> = std::result::Result<T, Error>;
