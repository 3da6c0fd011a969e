//! Error types for variable store operations.
//!
//! Errors are categorized so callers can tell a missing variable apart from
//! a rejected request or a transport failure, and give the user appropriate
//! feedback.

use std::fmt;

/// Result type alias for variable store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of store errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network or transport failure.
    Network,
    /// The variable (or its parent module) does not exist.
    NotFound,
    /// Credentials missing, invalid, or lacking permission.
    Auth,
    /// The store rejected the request payload.
    Rejected,
    /// The store answered with something we could not decode.
    Format,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::NotFound => "Variable not found",
            Self::Auth => "Not authorized",
            Self::Rejected => "Request rejected by the store",
            Self::Format => "Unexpected response format",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check your connection and the configured hostname",
            Self::NotFound => "Verify the organization, module name and provider",
            Self::Auth => "Check the API token and its permissions on the module",
            Self::Rejected => "Check the variable attributes for invalid values",
            Self::Format => "The hostname may not point at a compatible API",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the variable store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The addressed resource does not exist.
    #[error("resource not found")]
    NotFound,

    /// Authentication or authorization failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The store refused the request as invalid.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// Invalid response from the API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Http {
            message: message.into(),
            status,
        }
    }

    /// Map an HTTP status code to the matching error.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            401 | 403 => Self::Unauthorized(format!("HTTP {status}")),
            422 => Self::Rejected(format!("HTTP {status}")),
            _ => Self::http(format!("HTTP {status}"), Some(status)),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NotFound => ErrorCategory::NotFound,
            Error::Unauthorized(_) => ErrorCategory::Auth,
            Error::Rejected(_) => ErrorCategory::Rejected,
            Error::Http { .. } => ErrorCategory::Network,
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::Other(_) => ErrorCategory::Other,
        }
    }

    /// Whether this error means the addressed variable does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::from_status(code),
            ureq::Error::Json(e) => Self::InvalidResponse(e.to_string()),
            other => Self::http(other.to_string(), None),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
