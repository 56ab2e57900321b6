//! Port and process-owner domain models.

use serde::{Deserialize, Serialize};

// ============================================================================
// ProcessOwner
// ============================================================================

/// Why a port's owner could not be determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Unresolved {
    /// No matching entry, unparsable output, or the tool failed.
    Unknown,
    /// The lookup deadline expired.
    Timeout,
}

impl Unresolved {
    /// Sentinel text shown in place of a process id or name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Unresolved::Unknown => "Unknown",
            Unresolved::Timeout => "Timeout",
        }
    }
}

impl std::fmt::Display for Unresolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The process holding a port, or the reason it is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "resolution", rename_all = "camelCase")]
pub enum ProcessOwner {
    /// The owning process was found.
    Resolved { pid: u32, name: String },
    /// The owner could not be determined.
    Unresolved { reason: Unresolved },
}

impl ProcessOwner {
    pub fn resolved(pid: u32, name: impl Into<String>) -> Self {
        ProcessOwner::Resolved {
            pid,
            name: name.into(),
        }
    }

    pub fn unknown() -> Self {
        ProcessOwner::Unresolved {
            reason: Unresolved::Unknown,
        }
    }

    pub fn timeout() -> Self {
        ProcessOwner::Unresolved {
            reason: Unresolved::Timeout,
        }
    }

    /// The owning pid, if resolved.
    pub fn pid(&self) -> Option<u32> {
        match self {
            ProcessOwner::Resolved { pid, .. } => Some(*pid),
            ProcessOwner::Unresolved { .. } => None,
        }
    }

    /// Process id as text: the number, or the sentinel.
    pub fn process_id(&self) -> String {
        match self {
            ProcessOwner::Resolved { pid, .. } => pid.to_string(),
            ProcessOwner::Unresolved { reason } => reason.as_str().to_string(),
        }
    }

    /// Process name, or the sentinel.
    pub fn process_name(&self) -> &str {
        match self {
            ProcessOwner::Resolved { name, .. } => name,
            ProcessOwner::Unresolved { reason } => reason.as_str(),
        }
    }
}

// ============================================================================
// PortRecord
// ============================================================================

/// Status of a reported port. Only open ports are ever reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PortStatus {
    #[default]
    Active,
}

impl std::fmt::Display for PortStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortStatus::Active => f.write_str("Active"),
        }
    }
}

/// One listening port found by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRecord {
    /// The port number (e.g., 3000, 8080).
    pub port: u16,
    /// Owner of the listening socket.
    #[serde(flatten)]
    pub owner: ProcessOwner,
    pub status: PortStatus,
}

impl PortRecord {
    /// Create a record for an open port.
    pub fn active(port: u16, owner: ProcessOwner) -> Self {
        Self {
            port,
            owner,
            status: PortStatus::Active,
        }
    }

    pub fn process_id(&self) -> String {
        self.owner.process_id()
    }

    pub fn process_name(&self) -> &str {
        self.owner.process_name()
    }

    /// Pid that a shell may offer to kill.
    pub fn killable_pid(&self) -> Option<u32> {
        self.owner.pid()
    }
}

impl std::fmt::Display for PortRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            ":{} (PID: {}, Process: {})",
            self.port,
            self.process_id(),
            self.process_name()
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
