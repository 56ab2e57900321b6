//! Process termination with verification.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::error::{Error, Result};
use crate::ports::{CommandError, ProcessPlatform};
use crate::resolver::ResolutionCache;

/// Kills processes and confirms they are gone.
pub struct ProcessKiller<P: ProcessPlatform> {
    platform: Arc<P>,
    cache: Arc<ResolutionCache>,
    command_timeout: Duration,
    attempts: u32,
    base_delay: Duration,
}

impl<P: ProcessPlatform> ProcessKiller<P> {
    pub fn new(config: &ScanConfig, platform: Arc<P>, cache: Arc<ResolutionCache>) -> Self {
        Self {
            platform,
            cache,
            command_timeout: config.command_timeout(),
            attempts: config.kill_verify_attempts,
            base_delay: config.kill_verify_base_delay(),
        }
    }

    /// Forcefully terminate `process_id` and wait until it disappears.
    ///
    /// Round `k` of verification sleeps `base_delay * k` before checking,
    /// so the total wait is bounded by `base_delay * attempts * (attempts + 1) / 2`.
    pub async fn kill(&self, process_id: &str) -> Result<()> {
        let pid = parse_pid(process_id)?;

        if pid <= self.platform.protected_pid_ceiling() {
            return Err(Error::ProtectedProcess(pid));
        }

        info!(pid = pid, "Killing process");
        self.terminate(pid).await?;

        // The old owner's entries must not be served again
        self.cache.invalidate();

        for round in 1..=self.attempts {
            sleep(self.base_delay * round).await;

            match self.check_running(pid).await {
                Ok(false) => {
                    debug!(pid = pid, round = round, "Process gone");
                    return Ok(());
                }
                Ok(true) => debug!(pid = pid, round = round, "Process still running"),
                Err(e) => {
                    // A listing that cannot be produced has no entry for the pid
                    debug!(pid = pid, round = round, error = %e, "Presence check failed, treating process as gone");
                    return Ok(());
                }
            }
        }

        warn!(pid = pid, attempts = self.attempts, "Process survived kill");
        Err(Error::StillRunning {
            pid,
            attempts: self.attempts,
        })
    }

    async fn terminate(&self, pid: u32) -> Result<()> {
        let outcome = match timeout(self.command_timeout, self.platform.terminate(pid)).await {
            Ok(result) => result,
            Err(_) => Err(CommandError::TimedOut(self.command_timeout)),
        };

        outcome.map_err(|e| {
            warn!(pid = pid, error = %e, "Termination command failed");
            Error::TerminationFailed {
                pid,
                reason: e.to_string(),
            }
        })
    }

    async fn check_running(&self, pid: u32) -> std::result::Result<bool, CommandError> {
        timeout(self.command_timeout, self.platform.is_running(pid))
            .await
            .unwrap_or(Err(CommandError::TimedOut(self.command_timeout)))
    }
}

/// A process identifier must be a positive decimal integer.
fn parse_pid(process_id: &str) -> Result<u32> {
    match process_id.trim().parse::<u32>() {
        Ok(pid) if pid > 0 => Ok(pid),
        _ => Err(Error::InvalidProcessId(process_id.to_string())),
    }
}
