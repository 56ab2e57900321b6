//! Config command - show or initialize the configuration file.

use std::fmt::Write;

use anyhow::{bail, Result};
use devports_core::{ConfigStore, ScanConfig};

pub async fn show(store: &ConfigStore, json: bool) -> Result<()> {
    let config = store.load().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    print!("{}", describe(store, &config));
    Ok(())
}

pub async fn init(store: &ConfigStore, force: bool) -> Result<()> {
    if store.path().exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            store.path().display()
        );
    }

    store.save(&ScanConfig::default()).await?;
    println!("Wrote default configuration to {}", store.path().display());
    Ok(())
}

/// Human-readable listing of `config`, ending with the validation error if any.
fn describe(store: &ConfigStore, config: &ScanConfig) -> String {
    let source = if store.path().exists() {
        store.path().display().to_string()
    } else {
        format!("{} (not found, using defaults)", store.path().display())
    };

    let mut out = String::new();
    let _ = writeln!(out, "Config file: {}", source);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Port range:          {}-{}",
        config.port_range_start, config.port_range_end
    );
    let _ = writeln!(out, "Workers:             {}", config.num_workers);
    let _ = writeln!(out, "Probe timeout:       {}ms", config.probe_timeout_ms);
    let _ = writeln!(out, "Command timeout:     {}ms", config.command_timeout_ms);
    let _ = writeln!(
        out,
        "Kill verification:   {} attempts, {}ms base delay",
        config.kill_verify_attempts, config.kill_verify_base_delay_ms
    );
    let _ = writeln!(out, "Post-kill settle:    {}ms", config.post_kill_settle_delay_ms);
    let _ = writeln!(out, "Auto refresh:        {}s", config.auto_refresh_interval_secs);
    let _ = writeln!(out, "Cache TTL:           {}ms", config.cache_ttl_ms);

    if let Err(e) = config.validate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Invalid: {}", e);
    }
    out
}
