//! Host platform port (interface).

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// How a platform finds the owner of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    /// One call lists every socket with its pid; names need a second call.
    /// The listing is cached between lookups.
    ConnectionTable,
    /// The tool is queried per port and reports name and pid together.
    PerPort,
}

/// Failure of an external command.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The command could not be started.
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and reported failure.
    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },

    /// The deadline expired and the command was abandoned.
    #[error("Command timed out after {0:?}")]
    TimedOut(Duration),
}

/// Port for the operating system's process and socket tools.
///
/// Implementations only run commands and interpret their output. Deadlines,
/// caching and retries are applied by the caller; implementations must make
/// their futures safe to drop mid-flight (the child process is killed).
pub trait ProcessPlatform: Send + Sync + 'static {
    /// How owners are looked up on this platform.
    fn lookup_mode(&self) -> LookupMode;

    /// Pids at or below this value belong to the system and are never killed.
    fn protected_pid_ceiling(&self) -> u32 {
        0
    }

    /// Raw connection listing.
    ///
    /// `ConnectionTable` platforms ignore `port` and list every socket;
    /// `PerPort` platforms list only sockets on `port`.
    fn enumerate_connections(
        &self,
        port: u16,
    ) -> impl Future<Output = Result<String, CommandError>> + Send;

    /// Display name of a process, `None` if the tool has no entry for it.
    fn lookup_process_name(
        &self,
        pid: u32,
    ) -> impl Future<Output = Result<Option<String>, CommandError>> + Send;

    /// Forcefully terminate a process.
    fn terminate(&self, pid: u32) -> impl Future<Output = Result<(), CommandError>> + Send;

    /// Whether the process still appears in the process listing.
    fn is_running(&self, pid: u32) -> impl Future<Output = Result<bool, CommandError>> + Send;
}
