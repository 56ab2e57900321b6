//! Port owner resolution.
//!
//! Maps an open port to the process holding it, using the platform's
//! socket tool. Failures never propagate: they become
//! [`Unresolved`](crate::domain::Unresolved) owners.

mod cache;
mod matcher;

pub use cache::ResolutionCache;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;

use crate::domain::{ProcessOwner, Unresolved};
use crate::ports::{CommandError, LookupMode, ProcessPlatform};

use matcher::PortPattern;

/// Connection-table state of a listening socket.
const LISTENING: &str = "LISTENING";

/// Resolves the owning process of a port.
pub struct Resolver<P: ProcessPlatform> {
    platform: Arc<P>,
    cache: Arc<ResolutionCache>,
    command_timeout: Duration,
    /// Serializes cache refreshes so concurrent misses run one command.
    refresh_gate: Mutex<()>,
}

impl<P: ProcessPlatform> Resolver<P> {
    pub fn new(platform: Arc<P>, cache: Arc<ResolutionCache>, command_timeout: Duration) -> Self {
        Self {
            platform,
            cache,
            command_timeout,
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    /// Find the process listening on `port`.
    ///
    /// The whole lookup, including a name lookup, must finish within the
    /// command timeout; otherwise the owner is `Timeout`.
    pub async fn resolve(&self, port: u16) -> ProcessOwner {
        match timeout(self.command_timeout, self.lookup(port)).await {
            Ok(owner) => owner,
            Err(_) => {
                debug!(port = port, timeout = ?self.command_timeout, "Owner lookup timed out");
                ProcessOwner::timeout()
            }
        }
    }

    async fn lookup(&self, port: u16) -> ProcessOwner {
        match self.platform.lookup_mode() {
            LookupMode::ConnectionTable => self.lookup_in_table(port).await,
            LookupMode::PerPort => self.lookup_per_port(port).await,
        }
    }

    /// Expected table format (`netstat -ano`):
    ///
    /// ```text
    ///   Proto  Local Address          Foreign Address        State           PID
    ///   TCP    127.0.0.1:3000         0.0.0.0:0              LISTENING       5432
    /// ```
    async fn lookup_in_table(&self, port: u16) -> ProcessOwner {
        let table = match self.connection_table(port).await {
            Ok(table) => table,
            Err(e) => {
                debug!(port = port, error = %e, "Connection table unavailable");
                return ProcessOwner::unknown();
            }
        };

        let pattern = PortPattern::new(port);
        let pid = pattern
            .find_line(&table, local_address, Some(LISTENING))
            .and_then(|line| line.split_whitespace().last())
            .and_then(|pid| pid.parse::<u32>().ok());

        let Some(pid) = pid else {
            debug!(port = port, "No connection table entry");
            return ProcessOwner::unknown();
        };

        let name = match self.platform.lookup_process_name(pid).await {
            Ok(Some(name)) => name,
            Ok(None) => Unresolved::Unknown.to_string(),
            Err(e) => {
                debug!(pid = pid, error = %e, "Process name lookup failed");
                Unresolved::Unknown.to_string()
            }
        };

        ProcessOwner::resolved(pid, name)
    }

    /// Expected per-port format (`lsof`):
    ///
    /// ```text
    /// COMMAND  PID USER   FD   TYPE DEVICE SIZE/OFF NODE NAME
    /// node    4242 me     23u  IPv4 0x1234      0t0  TCP 127.0.0.1:3000 (LISTEN)
    /// ```
    async fn lookup_per_port(&self, port: u16) -> ProcessOwner {
        let output = match self.platform.enumerate_connections(port).await {
            Ok(output) => output,
            Err(e) => {
                debug!(port = port, error = %e, "Per-port query failed");
                return ProcessOwner::unknown();
            }
        };

        let pattern = PortPattern::new(port);
        let owner = pattern
            .find_line(&output, Some, None)
            .and_then(|line| {
                let mut fields = line.split_whitespace();
                let name = fields.next()?;
                let pid = fields.next()?.parse::<u32>().ok()?;
                Some(ProcessOwner::resolved(pid, name))
            });

        owner.unwrap_or_else(|| {
            debug!(port = port, "No listener entry");
            ProcessOwner::unknown()
        })
    }

    /// The connection table, from the cache when fresh.
    async fn connection_table(&self, port: u16) -> Result<Arc<str>, CommandError> {
        if let Some(table) = self.cache.fresh() {
            return Ok(table);
        }

        let _gate = self.refresh_gate.lock().await;
        // Another lookup may have refreshed while we waited
        if let Some(table) = self.cache.fresh() {
            return Ok(table);
        }

        let generation = self.cache.generation();
        let table: Arc<str> = self.platform.enumerate_connections(port).await?.into();
        if self.cache.store(generation, Arc::clone(&table)) {
            debug!(bytes = table.len(), "Connection table captured");
        }
        Ok(table)
    }
}

/// Local address column of a connection-table line (at least 5 columns).
fn local_address(line: &str) -> Option<&str> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 5 {
        return None;
    }
    Some(fields[1])
}
