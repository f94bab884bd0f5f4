use std::time::Duration;

use thiserror::Error;

use crate::coordinator::Group;
use crate::location::Location;

/// Convenient result alias for the walk graph library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a walk is structurally invalid. Nothing is recorded.
    #[error("invalid walk: {reason}")]
    InvalidWalk { reason: String },

    /// Raised when a query coordinate is NaN or infinite.
    #[error("invalid {field} location: coordinates must be finite numbers")]
    InvalidLocation { field: &'static str },

    /// Raised when a query references a place no walk has visited.
    #[error("location {location} does not match any known place")]
    UnknownLocation { location: Location },

    /// Raised when both endpoints are known but no directed path joins them.
    #[error("no path found from {origin} to {destination}")]
    PathNotFound {
        origin: Location,
        destination: Location,
    },

    /// Raised when an operation gave up waiting for its admission group.
    #[error("gave up after {}ms waiting for {group} admission", .waited.as_millis())]
    AdmissionTimedOut { group: Group, waited: Duration },

    /// Raised when resolver or coordinator settings are unusable.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Coarse classification that callers use to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request itself is wrong; retrying it unchanged will fail again.
    Validation,
    /// A location or path does not exist in the current graph.
    NotFound,
    /// The service was too busy to admit the operation in time.
    Unavailable,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// Whether resending the same request later may succeed.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Unavailable)
    }

    /// Stable snake_case label, used for metrics and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Internal => "internal_error",
        }
    }
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidWalk { .. } | Error::InvalidLocation { .. } => ErrorKind::Validation,
            Error::UnknownLocation { .. } | Error::PathNotFound { .. } => ErrorKind::NotFound,
            Error::AdmissionTimedOut { .. } => ErrorKind::Unavailable,
            Error::InvalidConfig { .. } => ErrorKind::Internal,
        }
    }

    pub(crate) fn invalid_walk(reason: impl Into<String>) -> Self {
        Error::InvalidWalk {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig {
            message: message.into(),
        }
    }
}
