//! Error types for the devports-core library.

use thiserror::Error;

use crate::domain::Unresolved;

/// Result type alias for devports operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by engine operations.
///
/// Scanning never produces these: a port whose owner cannot be found is
/// reported with a sentinel owner instead. Only configuration and process
/// termination fail with an `Error`.
#[derive(Error, Debug)]
pub enum Error {
    /// The process identifier is not a positive integer.
    #[error("Invalid process identifier: {0:?}")]
    InvalidProcessId(String),

    /// The process identifier belongs to a reserved system process.
    #[error("Cannot kill system process (PID {0})")]
    ProtectedProcess(u32),

    /// No killable process could be found listening on the port.
    #[error("No killable process on port {port} (owner {reason})")]
    NoOwner { port: u16, reason: Unresolved },

    /// The termination command failed, timed out, or could not be started.
    #[error("Failed to kill process {pid}: {reason}")]
    TerminationFailed { pid: u32, reason: String },

    /// The process was still listed after every verification round.
    #[error("Process {pid} still running after {attempts} verification attempts")]
    StillRunning { pid: u32, attempts: u32 },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// How a shell should present an [`Error`] to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request was refused before any termination command ran.
    Rejected,
    /// The operation was attempted and did not succeed.
    Failed,
    /// Anything else (configuration, I/O).
    Internal,
}

impl Error {
    /// Classify this error for presentation.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidProcessId(_) | Error::ProtectedProcess(_) | Error::NoOwner { .. } => {
                ErrorCategory::Rejected
            }
            Error::TerminationFailed { .. } | Error::StillRunning { .. } => ErrorCategory::Failed,
            Error::Config(_) | Error::Io(_) | Error::Json(_) => ErrorCategory::Internal,
        }
    }
}
