//! Kill command - terminate a process and confirm it exited.

use std::time::Instant;

use anyhow::{Context, Result};
use devports_core::{DevPortsEngine, Error, ProcessOwner, ProcessPlatform};

use super::scan;

/// What to kill.
pub enum Target {
    Pid(String),
    /// The process listening on this port.
    Port(u16),
}

pub async fn run<P: ProcessPlatform>(
    engine: &DevPortsEngine<P>,
    target: Target,
    rescan: bool,
    json: bool,
) -> Result<()> {
    let process_id = match target {
        Target::Pid(pid) => pid,
        Target::Port(port) => match engine.resolve(port).await {
            ProcessOwner::Resolved { pid, name } => {
                println!("Port {} is held by {} (PID {})", port, name, pid);
                pid.to_string()
            }
            ProcessOwner::Unresolved { reason } => {
                return Err(Error::NoOwner { port, reason }.into());
            }
        },
    };

    engine
        .kill(&process_id)
        .await
        .with_context(|| format!("Could not kill process {}", process_id))?;
    println!("Killed process {}", process_id);

    if rescan {
        let settle = engine.config().post_kill_settle_delay();
        tokio::time::sleep(settle).await;

        let started = Instant::now();
        let records = engine.scan().await;
        scan::print(&records, started.elapsed(), engine.config(), json)?;
    }

    Ok(())
}
