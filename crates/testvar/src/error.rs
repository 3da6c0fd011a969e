//! Error types for test variable reconciliation.
//!
//! Every error leaves the resource's prior recorded state authoritative:
//! nothing is assumed committed unless a remote call returned success.

use std::fmt;

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classes of reconciliation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed configuration, caught before any remote call.
    Validation,
    /// The remote store refused or failed a call.
    Remote,
    /// The host wired the resource to an unusable provider handle.
    HostIntegration,
    /// The operation was aborted before its remote call.
    Cancelled,
}

impl ErrorKind {
    /// Whether changing configuration or retrying can resolve the error.
    ///
    /// Host-integration errors are defects in the host itself.
    #[must_use]
    pub fn is_user_fixable(&self) -> bool {
        !matches!(self, Self::HostIntegration)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "invalid configuration"),
            Self::Remote => write!(f, "remote operation failed"),
            Self::HostIntegration => write!(f, "provider integration defect"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Errors raised while planning or reconciling a test variable.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration failed the attribute contract.
    #[error("invalid value for \"{attribute}\": {message}")]
    Validation {
        /// Offending attribute.
        attribute: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// A remote call failed.
    #[error("failed to {operation} {target}: {source}")]
    Remote {
        /// Verb of the failed call, e.g. "create".
        operation: &'static str,
        /// What was addressed, e.g. "env variable FOO" or "variable var-1".
        target: String,
        /// Underlying store error.
        source: varstore::Error,
    },

    /// The provider handle lacks the test variables capability.
    #[error(
        "provider handle of kind \"{actual}\" does not offer {expected}; this is a bug in the host wiring"
    )]
    HostIntegration {
        /// Capability the resource needs.
        expected: &'static str,
        /// What the handle reported itself as.
        actual: String,
    },

    /// An operation ran before a provider handle was configured.
    #[error("resource has no provider handle; configure it before applying")]
    NotConfigured,

    /// The cancellation signal was set before the remote call.
    #[error("{operation} cancelled before contacting the store")]
    Cancelled {
        /// Verb of the aborted call.
        operation: &'static str,
    },
}

impl Error {
    /// Create a validation error.
    pub fn validation(attribute: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            attribute,
            message: message.into(),
        }
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Remote { .. } => ErrorKind::Remote,
            Self::HostIntegration { .. } | Self::NotConfigured => ErrorKind::HostIntegration,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// The underlying store error, if any.
    #[must_use]
    pub fn remote(&self) -> Option<&varstore::Error> {
        match self {
            Self::Remote { source, .. } => Some(source),
            _ => None,
        }
    }
}
