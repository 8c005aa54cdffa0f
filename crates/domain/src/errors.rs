//! Error types used throughout the application

use std::fmt;

use thiserror::Error;

use crate::types::DocumentType;

/// Main error type for LedgerBridge
#[derive(Error, Debug, Clone)]
pub enum LedgerBridgeError {
    /// The identity server rejected an authorization code.
    #[error("Authorization code exchange failed ({status}): {body}")]
    AuthExchange { status: u16, body: String },

    #[error("Not authenticated: no token record for this connection")]
    NotAuthenticated,

    /// The identity server rejected a refresh token.
    #[error("Token refresh failed ({status}): {body}")]
    Refresh { status: u16, body: String },

    #[error("No tenant id configured; re-run authorization")]
    TenantMissing,

    #[error("Remote API error ({status}): {body}")]
    RemoteApi { status: u16, body: String },

    #[error("Invalid response from remote API: {0}")]
    InvalidResponse(String),

    #[error("Document type {0} cannot be pushed as a bill")]
    UnsupportedDocumentType(DocumentType),

    #[error("Failed to push bill {bill_id}: {source}")]
    PushFailed {
        bill_id: String,
        #[source]
        source: Box<LedgerBridgeError>,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerBridgeError {
    /// Classify this error for retry and messaging decisions.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AuthExchange { .. } | Self::NotAuthenticated | Self::Refresh { .. } => {
                ErrorCategory::Authentication
            }
            Self::TenantMissing | Self::Config(_) => ErrorCategory::Configuration,
            Self::RemoteApi { status, .. } => ErrorCategory::from_status_code(*status),
            Self::UnsupportedDocumentType(_) | Self::InvalidInput(_) => ErrorCategory::Validation,
            Self::PushFailed { source, .. } => source.category(),
            Self::Network(_) => ErrorCategory::Network,
            Self::InvalidResponse(_) | Self::Storage(_) | Self::Internal(_) => {
                ErrorCategory::Unknown
            }
        }
    }

    /// Errors that mean the caller must (re-)authorize before anything else
    /// can succeed. These always propagate to the caller unchanged.
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::AuthExchange { .. }
                | Self::NotAuthenticated
                | Self::Refresh { .. }
                | Self::TenantMissing
        )
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Build a `RemoteApi` error from a status code and raw response body.
    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        Self::RemoteApi { status, body: body.into() }
    }
}

/// Error category for external consumption
///
/// Classifies errors by type to enable appropriate retry strategies
/// and user-facing messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Credentials missing, expired or rejected
    Authentication,

    /// Rate limit exceeded (429)
    RateLimited,

    /// Invalid request or data (4xx except 401, 403, 429)
    Validation,

    /// Remote server is unavailable (5xx errors)
    ServerUnavailable,

    /// Connection failure or timeout
    Network,

    /// Missing or invalid local configuration
    Configuration,

    /// Unknown or unclassified error
    Unknown,
}

impl ErrorCategory {
    /// Classify an HTTP status code
    #[must_use]
    pub fn from_status_code(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            429 => Self::RateLimited,
            500..=599 => Self::ServerUnavailable,
            400..=499 => Self::Validation,
            _ => Self::Unknown,
        }
    }

    /// Returns true if this error type should be retried
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::ServerUnavailable | Self::RateLimited)
    }

    /// Returns user-friendly message for this category
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Authentication => {
                "Authentication with the accounting platform failed. Please connect your account \
                 again."
            }
            Self::RateLimited => {
                "Too many requests. Please wait a couple minutes before trying again."
            }
            Self::Validation => "The accounting platform rejected the request data.",
            Self::ServerUnavailable => {
                "The accounting platform is temporarily unavailable. Please try again in a minute."
            }
            Self::Network => {
                "No network connection. Please check your internet connection and try again."
            }
            Self::Configuration => {
                "The connection is not fully configured. Check the client credentials and tenant."
            }
            Self::Unknown => {
                "An unexpected error occurred. Please try again or contact support if the problem \
                 persists."
            }
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "Authentication Failed"),
            Self::RateLimited => write!(f, "Rate Limited"),
            Self::Validation => write!(f, "Validation Error"),
            Self::ServerUnavailable => write!(f, "Server Unavailable"),
            Self::Network => write!(f, "Network Error"),
            Self::Configuration => write!(f, "Configuration Error"),
            Self::Unknown => write!(f, "Unknown Error"),
        }
    }
}

/// Result type alias for LedgerBridge operations
pub type Result<T> = std::result::Result<T, LedgerBridgeError>;
