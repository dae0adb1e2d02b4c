//! errors.rs - Error types for the sra-core library.
//!
//! Two layers of errors live here. [`ServiceError`] classifies what a backend
//! call reported (not found, permission denied, transport failure, ...) and is
//! produced by every live and stub adapter. [`RemediationError`] is what the
//! action executor returns: it names the action and the resource and carries
//! the underlying `ServiceError` unchanged, so callers can decide on retries
//! without string matching.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// Classified failure of a single backend call.
///
/// Adapters convert transport and HTTP failures into one of these variants.
/// The type is `Clone` so stubs can hand the same scripted error out repeatedly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("deadline exceeded before the call completed")]
    DeadlineExceeded,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("failed to encode request: {0}")]
    Encode(String),

    #[error("operation reported failure: {0}")]
    OperationFailed(String),

    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },
}

impl ServiceError {
    /// Maps a non-success HTTP status code onto the taxonomy.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => ServiceError::InvalidRequest(message),
            401 => ServiceError::Unauthenticated(message),
            403 => ServiceError::PermissionDenied(message),
            404 => ServiceError::NotFound(message),
            429 | 502 | 503 => ServiceError::Unavailable(message),
            504 => ServiceError::DeadlineExceeded,
            _ => ServiceError::Status { status, message },
        }
    }

    /// True when the same call may succeed if repeated later.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Unavailable(_)
            | ServiceError::DeadlineExceeded
            | ServiceError::Transport(_) => true,
            ServiceError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// The closed set of failure classes an action invocation can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    Fetch,
    Apply,
    Annotation,
}

/// Error returned by the action executor.
///
/// Every variant carries the action name and enough of the resource identity
/// for an operator to find the affected object.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RemediationError {
    #[error("{action}: invalid input: {reason}")]
    InvalidInput { action: &'static str, reason: String },

    #[error("{action}: failed to fetch {resource}: {source}")]
    Fetch {
        action: &'static str,
        resource: String,
        source: ServiceError,
    },

    #[error("{action}: failed to apply change to {resource}: {source}")]
    Apply {
        action: &'static str,
        resource: String,
        source: ServiceError,
    },

    /// Only ever reported inside a successful outcome; never returned as `Err`.
    #[error("{action}: failed to annotate {target}: {source}")]
    Annotation {
        action: &'static str,
        target: String,
        source: ServiceError,
    },
}

impl RemediationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RemediationError::InvalidInput { .. } => ErrorKind::InvalidInput,
            RemediationError::Fetch { .. } => ErrorKind::Fetch,
            RemediationError::Apply { .. } => ErrorKind::Apply,
            RemediationError::Annotation { .. } => ErrorKind::Annotation,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            RemediationError::InvalidInput { action, .. }
            | RemediationError::Fetch { action, .. }
            | RemediationError::Apply { action, .. }
            | RemediationError::Annotation { action, .. } => action,
        }
    }

    /// The backend error underneath, if the failure came from a service call.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            RemediationError::InvalidInput { .. } => None,
            RemediationError::Fetch { source, .. }
            | RemediationError::Apply { source, .. }
            | RemediationError::Annotation { source, .. } => Some(source),
        }
    }

    /// Invalid input is never retryable; service failures defer to their class.
    pub fn is_retryable(&self) -> bool {
        self.service_error().is_some_and(ServiceError::is_retryable)
    }
}

/// Errors raised while validating a loaded [`crate::config::SraConfig`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("timeout_secs must be at most {max}, got {value}")]
    TimeoutTooLarge { value: u64, max: u64 },

    #[error("mark_prefix must not be empty")]
    EmptyMarkPrefix,

    #[error("endpoint '{name}' must be an http(s) URL, got '{value}'")]
    InvalidEndpoint { name: &'static str, value: String },
}
