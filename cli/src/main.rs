//! DevPorts CLI - Find and kill processes on local ports
//!
//! A command-line tool for scanning loopback TCP ports, showing which
//! process owns each open port, and killing those processes.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use devports_core::{ConfigStore, DevPortsEngine, Error, ErrorCategory, ScanConfig};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `devports_core=debug`).
const LOG_ENV: &str = "DEVPORTS_LOG";

#[derive(Parser)]
#[command(name = "devports")]
#[command(author, version, about = "Find and kill processes on local ports")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file (default: ~/.devports/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan ports and show their owning processes
    #[command(alias = "ls")]
    Scan(RangeArgs),

    /// Kill a process by PID, or the process listening on a port
    Kill {
        /// Process ID to kill
        #[arg(required_unless_present = "port", allow_hyphen_values = true)]
        pid: Option<String>,

        /// Kill the owner of this port instead
        #[arg(short, long, conflicts_with = "pid")]
        port: Option<u16>,

        /// Rescan after the kill settles
        #[arg(long)]
        rescan: bool,
    },

    /// Rescan periodically until Ctrl-C
    Watch(RangeArgs),

    /// Show or initialize the configuration file
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Args, Default)]
struct RangeArgs {
    /// First port to scan
    #[arg(short, long)]
    start: Option<u16>,

    /// Last port to scan
    #[arg(short, long)]
    end: Option<u16>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,
}

impl RangeArgs {
    fn apply(&self, config: &mut ScanConfig) {
        if let Some(start) = self.start {
            config.port_range_start = start;
        }
        if let Some(end) = self.end {
            config.port_range_end = end;
        }
        if let Some(workers) = self.workers {
            config.num_workers = workers;
        }
    }
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code(&e)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let store = match cli.config {
        Some(path) => ConfigStore::with_path(path),
        None => ConfigStore::new()?,
    };

    match cli.command.unwrap_or(Commands::Scan(RangeArgs::default())) {
        Commands::Scan(range) => {
            let engine = build_engine(&store, &range).await?;
            commands::scan::run(&engine, cli.json).await?;
        }
        Commands::Kill { pid, port, rescan } => {
            let engine = build_engine(&store, &RangeArgs::default()).await?;
            let target = match (pid, port) {
                (_, Some(port)) => commands::kill::Target::Port(port),
                (Some(pid), None) => commands::kill::Target::Pid(pid),
                (None, None) => bail!("a PID or --port is required"),
            };
            commands::kill::run(&engine, target, rescan, cli.json).await?;
        }
        Commands::Watch(range) => {
            let engine = build_engine(&store, &range).await?;
            commands::watch::run(&engine, cli.json).await?;
        }
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => commands::config::show(&store, cli.json).await?,
            ConfigAction::Init { force } => commands::config::init(&store, force).await?,
        },
    }

    Ok(())
}

async fn build_engine(store: &ConfigStore, range: &RangeArgs) -> Result<DevPortsEngine> {
    let mut config = store.load().await?;
    range.apply(&mut config);
    Ok(DevPortsEngine::new(config)?)
}

/// Log to stderr so JSON on stdout stays parseable.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// 2 when the request was refused, 1 for everything else.
fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<Error>().map(Error::category) {
        Some(ErrorCategory::Rejected) => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}
