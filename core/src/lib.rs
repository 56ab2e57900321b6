//! DevPorts Core Library
//!
//! Finds which local processes are listening on loopback TCP ports and
//! terminates them on request. Provides functionality to:
//! - Probe a port range concurrently with a bounded worker pool
//! - Resolve the owning process of each open port
//! - Kill a process by PID and verify that it exited
//! - Load and save the scan configuration
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Port records and process owners
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: Host command implementations
//! - `resolver`, `scanner`, `killer`: the operations, generic over the platform
//!
//! # Platform Support
//! - Windows: `netstat -ano`, `tasklist`, `taskkill`
//! - macOS/Linux: `lsof`, `ps`, `kill`

pub mod adapters;
pub mod domain;
pub mod ports;

pub mod config;
pub mod engine;
pub mod error;
pub mod killer;
pub mod resolver;
pub mod scanner;

// Re-export domain types (primary API)
pub use domain::{PortRecord, PortStatus, ProcessOwner, Unresolved};

// Re-export other commonly used types
pub use adapters::{HostPlatform, LsofPlatform, NetstatPlatform};
pub use config::{ConfigStore, ScanConfig};
pub use engine::DevPortsEngine;
pub use error::{Error, ErrorCategory, Result};
pub use killer::ProcessKiller;
pub use ports::{CommandError, LookupMode, ProcessPlatform};
pub use resolver::{ResolutionCache, Resolver};
pub use scanner::{PortScanner, Prober};
