//! Error types for resource convergence.
//!
//! Errors are grouped by the phase that raises them. Preparation errors are
//! configuration defects and are never worth retrying; backend errors come
//! from contact with the live system and may be retried by the caller.

use crate::status::Status;
use thiserror::Error;

/// Phase in which an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Raised while validating parameters, before any system contact
    Prepare,
    /// Raised while querying or mutating the live system
    Backend,
    /// Raised while registering or looking up resource kinds
    Registry,
}

impl Phase {
    /// Get a user-friendly description of this phase.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Prepare => "Invalid resource parameters",
            Self::Backend => "System operation failed",
            Self::Registry => "Resource kind registry error",
        }
    }
}

/// Errors that can occur while preparing, checking or applying resources.
#[derive(Debug, Error)]
pub enum Error {
    /// A required parameter was absent or empty
    #[error("{kind} requires a \"{field}\" parameter")]
    MissingParameter {
        /// Resource kind being prepared
        kind: String,
        /// Name of the missing parameter
        field: &'static str,
    },

    /// Two mutually exclusive parameters were both supplied
    #[error("{kind} \"{first}\" and \"{second}\" both indicated, choose one")]
    ConflictingParameter {
        /// Resource kind being prepared
        kind: String,
        /// First of the conflicting parameters
        first: &'static str,
        /// Second of the conflicting parameters
        second: &'static str,
    },

    /// A numeric parameter was outside its legal domain
    #[error("{kind} \"{field}\" parameter out of range")]
    Range {
        /// Resource kind being prepared
        kind: String,
        /// Name of the out-of-range parameter
        field: &'static str,
    },

    /// A numeric parameter did not parse as a non-negative integer
    #[error("{kind} \"{field}\" parameter must be a non-negative integer, got \"{value}\"")]
    Format {
        /// Resource kind being prepared
        kind: String,
        /// Name of the malformed parameter
        field: &'static str,
        /// The offending value
        value: String,
    },

    /// An enumerated parameter did not match any allowed token
    #[error("{kind} \"{field}\" parameter invalid, use {}", alternatives(.allowed))]
    InvalidEnum {
        /// Resource kind being prepared
        kind: String,
        /// Name of the invalid parameter
        field: &'static str,
        /// The accepted tokens
        allowed: Vec<&'static str>,
    },

    /// The render service failed to resolve a parameter
    #[error("{kind} \"{field}\" parameter could not be rendered: {source}")]
    Render {
        /// Resource kind being prepared
        kind: String,
        /// Name of the parameter being rendered
        field: &'static str,
        /// Underlying render failure
        #[source]
        source: anyhow::Error,
    },

    /// Raw parameters could not be decoded into the kind's preparer
    #[error("{kind} parameters invalid: {message}")]
    Decode {
        /// Resource kind being decoded
        kind: String,
        /// Decoder message
        message: String,
    },

    /// Querying the live system failed
    #[error("querying {target} failed: {source}")]
    BackendQuery {
        /// The resource instance being queried
        target: String,
        /// Underlying backend failure
        #[source]
        source: anyhow::Error,
    },

    /// Mutating the live system failed or did not take effect
    #[error("changing {target} failed: {source}")]
    BackendMutation {
        /// The resource instance being changed
        target: String,
        /// Underlying backend failure
        #[source]
        source: anyhow::Error,
    },

    /// A child of a module failed
    #[error("{path}: {source}")]
    Child {
        /// Path of the failing child inside the module tree
        path: String,
        /// The child's error
        #[source]
        source: Box<Error>,
    },

    /// No resource kind is registered under this name
    #[error("unknown resource kind: {0}")]
    UnknownResourceKind(String),

    /// A resource kind was registered twice
    #[error("resource kind registered twice: {0}")]
    DuplicateRegistration(String),
}

impl Error {
    /// Build a query error for `target`.
    pub fn query(target: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::BackendQuery {
            target: target.into(),
            source: source.into(),
        }
    }

    /// Build a mutation error for `target`.
    pub fn mutation(target: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::BackendMutation {
            target: target.into(),
            source: source.into(),
        }
    }

    /// Get the phase that raised this error.
    pub fn phase(&self) -> Phase {
        match self {
            Error::MissingParameter { .. }
            | Error::ConflictingParameter { .. }
            | Error::Range { .. }
            | Error::Format { .. }
            | Error::InvalidEnum { .. }
            | Error::Render { .. }
            | Error::Decode { .. } => Phase::Prepare,
            Error::BackendQuery { .. } | Error::BackendMutation { .. } => Phase::Backend,
            Error::Child { source, .. } => source.phase(),
            Error::UnknownResourceKind(_) | Error::DuplicateRegistration(_) => Phase::Registry,
        }
    }

    /// Whether retrying the same operation could succeed.
    ///
    /// Only failures of system contact qualify; a bad parameter stays bad.
    pub fn is_retryable(&self) -> bool {
        self.phase() == Phase::Backend
    }
}

/// Join allowed tokens as "a or b", "a, b or c".
fn alternatives(allowed: &[&str]) -> String {
    match allowed {
        [] => String::new(),
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    }
}

/// A failed check or apply, carrying the status that was reached.
///
/// For apply, the status describes the attempted change. The task that
/// produced it remains valid for another check or apply.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct Failure {
    /// Status at the point of failure
    pub status: Status,
    /// What went wrong
    #[source]
    pub error: Error,
}

impl Failure {
    /// Pair an error with the status reached before it occurred.
    pub fn new(status: Status, error: Error) -> Self {
        Self { status, error }
    }
}

impl From<Error> for Failure {
    fn from(error: Error) -> Self {
        Self {
            status: Status::fatal(error.to_string()),
            error,
        }
    }
}

/// Result type for convergence operations.
pub type Result<T> = std::result::Result<T, Error>;
