//! Per-port platform (Unix tools).
//!
//! Uses the following system commands:
//! - `lsof -nP -iTCP:PORT -sTCP:LISTEN` to find the listener on one port
//! - `ps -p PID -o comm=` for names, `ps -p PID -o pid=` for presence checks
//! - `kill -9 PID` to terminate

use crate::ports::{CommandError, LookupMode, ProcessPlatform};

use super::command;

/// Platform whose socket tool is queried one port at a time.
#[derive(Debug, Default, Clone)]
pub struct LsofPlatform;

impl LsofPlatform {
    pub fn new() -> Self {
        Self
    }

    /// First non-empty trimmed line of `ps -o <field>=` output.
    ///
    /// `ps -p` exits non-zero when the pid does not exist; that is an
    /// answer, not a failure.
    async fn ps_field(&self, pid: u32, field: &str) -> Result<Option<String>, CommandError> {
        let format = format!("{}=", field);
        let output = command::output("ps", &["-p", &pid.to_string(), "-o", &format]).await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let value = stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string);

        if !output.status.success() && value.is_none() {
            return Ok(None);
        }
        Ok(value)
    }
}

impl ProcessPlatform for LsofPlatform {
    fn lookup_mode(&self) -> LookupMode {
        LookupMode::PerPort
    }

    async fn enumerate_connections(&self, port: u16) -> Result<String, CommandError> {
        // -n/-P keep addresses and ports numeric so the port pattern can match
        let selector = format!("-iTCP:{}", port);
        command::stdout("lsof", &["-nP", &selector, "-sTCP:LISTEN"]).await
    }

    async fn lookup_process_name(&self, pid: u32) -> Result<Option<String>, CommandError> {
        self.ps_field(pid, "comm").await
    }

    async fn terminate(&self, pid: u32) -> Result<(), CommandError> {
        command::stdout("kill", &["-9", &pid.to_string()]).await?;
        Ok(())
    }

    async fn is_running(&self, pid: u32) -> Result<bool, CommandError> {
        let listed = self.ps_field(pid, "pid").await?;
        Ok(listed.is_some_and(|p| p.parse::<u32>().ok() == Some(pid)))
    }
}
