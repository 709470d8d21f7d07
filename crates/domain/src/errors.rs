//! Error types used throughout the session layer
//!
//! `ApiError` is what callers of the dispatchers see. `TransportError` and
//! `StorageError` are produced at the port boundaries and convert into it.

use std::time::Duration;

use thiserror::Error;

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Authentication errors (401, 403)
    Authentication,
    /// Rate limiting errors (429)
    RateLimit,
    /// Server errors (5xx)
    Server,
    /// Client errors (4xx except auth)
    Client,
    /// Network/connection errors and timeouts
    Network,
    /// Local configuration, storage, or decoding errors
    Config,
}

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {path} returned status 401")]
    Unauthorized { path: String, body: String },

    #[error("Forbidden: {path} returned status 403")]
    Forbidden { path: String, body: String },

    #[error("Rate limit exceeded: {path}")]
    RateLimit { path: String, body: String },

    #[error("Client error: {path} returned status {status}")]
    Client { status: u16, path: String, body: String },

    #[error("Server error: {path} returned status {status}")]
    Server { status: u16, path: String, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Credential storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Map a non-success HTTP status into the matching error variant.
    pub fn from_status(status: u16, path: &str, body: String) -> Self {
        let path = path.to_string();
        match status {
            401 => Self::Unauthorized { path, body },
            403 => Self::Forbidden { path, body },
            429 => Self::RateLimit { path, body },
            500..=599 => Self::Server { status, path, body },
            _ => Self::Client { status, path, body },
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Unauthorized { .. } | Self::Forbidden { .. } => ApiErrorCategory::Authentication,
            Self::RateLimit { .. } => ApiErrorCategory::RateLimit,
            Self::Server { .. } => ApiErrorCategory::Server,
            Self::Client { .. } => ApiErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Decode(_) | Self::Storage(_) | Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    /// True only for a 401 response, the one failure a refresh can fix.
    pub fn is_stale_credential(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::RateLimit { .. } => Some(429),
            Self::Client { status, .. } | Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body carried by the error, for inline rendering by callers.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { body, .. }
            | Self::Forbidden { body, .. }
            | Self::RateLimit { body, .. }
            | Self::Client { body, .. }
            | Self::Server { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Errors raised by a transport adapter before any response is available
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("network failure: {0}")]
    Network(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(after) => Self::Timeout(after),
            TransportError::Network(message) => Self::Network(message),
            TransportError::InvalidRequest(message) => Self::Config(message),
        }
    }
}

/// Errors raised by a secret storage backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("secure storage unavailable: {0}")]
    Unavailable(String),

    #[error("stored credential is corrupt: {0}")]
    Corrupt(String),
}

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, ApiError>;
