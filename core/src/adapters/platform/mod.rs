//! Host platform adapters.
//!
//! Two command sets implement [`ProcessPlatform`]:
//! - Windows: `netstat`, `tasklist`, `taskkill` ([`NetstatPlatform`])
//! - macOS/Linux: `lsof`, `ps`, `kill` ([`LsofPlatform`])
//!
//! [`HostPlatform`] picks one of them once, from the running OS.

mod command;
mod lsof;
mod netstat;

pub use lsof::LsofPlatform;
pub use netstat::NetstatPlatform;

use crate::ports::{CommandError, LookupMode, ProcessPlatform};

/// The command set for the current host.
#[derive(Debug, Clone)]
pub enum HostPlatform {
    ConnectionTable(NetstatPlatform),
    PerPort(LsofPlatform),
}

impl HostPlatform {
    /// Select the command set for the running operating system.
    pub fn detect() -> Self {
        Self::for_os(std::env::consts::OS)
    }

    /// Select the command set for an OS name as reported by `std::env::consts::OS`.
    pub fn for_os(os: &str) -> Self {
        match os {
            "windows" => HostPlatform::ConnectionTable(NetstatPlatform::new()),
            _ => HostPlatform::PerPort(LsofPlatform::new()),
        }
    }
}

impl Default for HostPlatform {
    fn default() -> Self {
        Self::detect()
    }
}

impl ProcessPlatform for HostPlatform {
    fn lookup_mode(&self) -> LookupMode {
        match self {
            HostPlatform::ConnectionTable(p) => p.lookup_mode(),
            HostPlatform::PerPort(p) => p.lookup_mode(),
        }
    }

    fn protected_pid_ceiling(&self) -> u32 {
        match self {
            HostPlatform::ConnectionTable(p) => p.protected_pid_ceiling(),
            HostPlatform::PerPort(p) => p.protected_pid_ceiling(),
        }
    }

    async fn enumerate_connections(&self, port: u16) -> Result<String, CommandError> {
        match self {
            HostPlatform::ConnectionTable(p) => p.enumerate_connections(port).await,
            HostPlatform::PerPort(p) => p.enumerate_connections(port).await,
        }
    }

    async fn lookup_process_name(&self, pid: u32) -> Result<Option<String>, CommandError> {
        match self {
            HostPlatform::ConnectionTable(p) => p.lookup_process_name(pid).await,
            HostPlatform::PerPort(p) => p.lookup_process_name(pid).await,
        }
    }

    async fn terminate(&self, pid: u32) -> Result<(), CommandError> {
        match self {
            HostPlatform::ConnectionTable(p) => p.terminate(pid).await,
            HostPlatform::PerPort(p) => p.terminate(pid).await,
        }
    }

    async fn is_running(&self, pid: u32) -> Result<bool, CommandError> {
        match self {
            HostPlatform::ConnectionTable(p) => p.is_running(pid).await,
            HostPlatform::PerPort(p) => p.is_running(pid).await,
        }
    }
}
