//! Scan command - show open ports and their owners.

use std::time::{Duration, Instant};

use anyhow::Result;
use devports_core::{DevPortsEngine, PortRecord, ScanConfig};

pub async fn run(engine: &DevPortsEngine, json: bool) -> Result<()> {
    let started = Instant::now();
    let records = engine.scan().await;
    print(&records, started.elapsed(), engine.config(), json)
}

pub fn print(
    records: &[PortRecord],
    elapsed: Duration,
    config: &ScanConfig,
    json: bool,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!(
            "No open ports in {}-{}.",
            config.port_range_start, config.port_range_end
        );
    } else {
        print!("{}", render_table(records));
        println!("\nTotal: {} ports", records.len());
    }

    println!(
        "Scanned {} ports with {} workers in {:.2}s",
        config.port_count(),
        config.num_workers,
        elapsed.as_secs_f64()
    );
    Ok(())
}

fn render_table(records: &[PortRecord]) -> String {
    let mut out = format!("{:<6} {:<8} {:<24} STATUS\n", "PORT", "PID", "PROCESS");
    out.push_str(&"-".repeat(48));
    out.push('\n');

    for record in records {
        out.push_str(&format!(
            "{:<6} {:<8} {:<24} {}\n",
            record.port,
            record.process_id(),
            truncate(record.process_name(), 24),
            record.status
        ));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max - 1).collect();
        format!("{}…", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devports_core::ProcessOwner;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("node", 24), "node");
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("ñandú-server", 6), "ñandú…");
    }

    #[test]
    fn test_table_rows() {
        let records = vec![
            PortRecord::active(3000, ProcessOwner::resolved(4242, "node")),
            PortRecord::active(5432, ProcessOwner::timeout()),
        ];
        let table = render_table(&records);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("PORT"));
        assert!(lines[2].starts_with("3000"));
        assert!(lines[2].contains("4242"));
        assert!(lines[2].ends_with("Active"));
        assert!(lines[3].contains("Timeout"));
    }
}
