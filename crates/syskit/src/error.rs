//! Error types for system backends.
//!
//! Errors are categorized from command output so that callers can tell a
//! missing package from a permission problem without parsing messages.

use std::path::PathBuf;
use thiserror::Error;

/// Categories of backend errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Target not found (package, unit, account)
    NotFound,
    /// Permission denied (usually needs root)
    Permission,
    /// Conflicts with existing state (e.g. uid already in use)
    Conflict,
    /// Tool missing from the system
    ToolNotFound,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Target not found",
            Self::Permission => "Permission denied",
            Self::Conflict => "Conflicts with existing state",
            Self::ToolNotFound => "System tool not installed",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::NotFound => "Verify the name and the configured repositories",
            Self::Permission => "Run as root or with appropriate privileges",
            Self::Conflict => "Resolve the conflicting state and retry",
            Self::ToolNotFound => "Install the missing tool or pick another backend",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur while querying or changing the system.
#[derive(Debug, Error)]
pub enum Error {
    /// Target not found
    #[error("not found: {name}")]
    NotFound {
        /// Name of the missing target
        name: String,
    },

    /// Permission denied
    #[error("permission denied: {message}")]
    Permission {
        /// Details about what permission was denied
        message: String,
    },

    /// Conflicts with existing state
    #[error("conflict: {message}")]
    Conflict {
        /// Description of the conflict
        message: String,
    },

    /// The program could not be started
    #[error("{program} could not be executed: {source}")]
    ToolNotFound {
        /// Program that failed to start
        program: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// Command ran but reported failure
    #[error("{program} failed: {stderr}")]
    CommandFailed {
        /// Program that failed
        program: String,
        /// Exit code, if the process exited normally
        code: Option<i32>,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// A system database line could not be parsed
    #[error("invalid entry in {} at line {line}: {message}", path.display())]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Line number (1-indexed)
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Permission { .. } => ErrorCategory::Permission,
            Error::Conflict { .. } => ErrorCategory::Conflict,
            Error::ToolNotFound { .. } => ErrorCategory::ToolNotFound,
            _ => ErrorCategory::Other,
        }
    }

    /// Create an error from failed command output.
    ///
    /// Analyzes stderr to categorize the error appropriately.
    pub fn from_output(program: &str, code: Option<i32>, stderr: &str, target: &str) -> Self {
        let stderr_lower = stderr.to_lowercase();

        if stderr_lower.contains("no package")
            || stderr_lower.contains("no match for argument")
            || stderr_lower.contains("unable to find a match")
            || stderr_lower.contains("does not exist")
            || stderr_lower.contains("not loaded")
            || stderr_lower.contains("could not be found")
        {
            return Error::NotFound {
                name: target.to_string(),
            };
        }

        if stderr_lower.contains("permission denied")
            || stderr_lower.contains("operation not permitted")
            || stderr_lower.contains("you need to be root")
            || stderr_lower.contains("access denied")
            || stderr_lower.contains("interactive authentication required")
        {
            return Error::Permission {
                message: stderr.trim().to_string(),
            };
        }

        if stderr_lower.contains("already exists")
            || stderr_lower.contains("is not unique")
            || stderr_lower.contains("currently used by process")
            || stderr_lower.contains("conflict")
        {
            return Error::Conflict {
                message: stderr.trim().to_string(),
            };
        }

        Error::CommandFailed {
            program: program.to_string(),
            code,
            stderr: stderr.trim().to_string(),
        }
    }
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_output_not_found() {
        let err = Error::from_output("yum", Some(1), "Error: Unable to find a match: nginxx", "nginxx");
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.to_string(), "not found: nginxx");
    }

    #[test]
    fn test_from_output_permission() {
        let err = Error::from_output(
            "useradd",
            Some(1),
            "useradd: Permission denied.\nuseradd: cannot lock /etc/passwd",
            "svc",
        );
        assert_eq!(err.category(), ErrorCategory::Permission);
    }

    #[test]
    fn test_from_output_conflict() {
        let err = Error::from_output("useradd", Some(4), "useradd: UID 1234 is not unique", "svc");
        assert_eq!(err.category(), ErrorCategory::Conflict);
    }

    #[test]
    fn test_from_output_fallback() {
        let err = Error::from_output("systemctl", Some(3), "  something odd  ", "nginx.service");
        assert_eq!(err.category(), ErrorCategory::Other);
        assert_eq!(err.to_string(), "systemctl failed: something odd");
    }
}
