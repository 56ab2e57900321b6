//! Watch command - rescan on an interval until interrupted.

use std::time::Instant;

use anyhow::{Context, Result};
use devports_core::DevPortsEngine;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use super::scan;

pub async fn run(engine: &DevPortsEngine, json: bool) -> Result<()> {
    let period = engine.config().auto_refresh_interval();
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result.context("Failed to listen for Ctrl-C")?;
                info!("Watch stopped");
                return Ok(());
            }
            _ = ticker.tick() => {
                let started = Instant::now();
                let records = engine.scan().await;
                if !json {
                    println!();
                }
                scan::print(&records, started.elapsed(), engine.config(), json)?;
                if !json {
                    println!("Next scan in {}s (Ctrl-C to stop)", period.as_secs());
                }
            }
        }
    }
}
