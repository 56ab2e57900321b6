//! Scripted platform shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use devports_core::{CommandError, DevPortsEngine, LookupMode, ProcessPlatform, ScanConfig};
use parking_lot::Mutex;
use tokio::time::Instant;

/// A [`ProcessPlatform`] that runs nothing and counts every call.
pub struct FakePlatform {
    pub mode: LookupMode,
    pub ceiling: u32,

    /// Connection table returned in `ConnectionTable` mode.
    pub table: String,
    /// Name and pid reported for any port in `PerPort` mode.
    pub listener: Option<(String, u32)>,
    pub enumerate_delay: Duration,
    pub enumerate_fails: bool,
    /// Enumerating this port panics.
    pub panic_port: Option<u16>,

    pub names: HashMap<u32, String>,
    pub name_lookup_fails: bool,

    pub terminate_error: Option<String>,
    pub terminate_delay: Duration,

    /// The n-th presence check (1-based) and later ones report the process gone.
    pub vanish_on_check: Option<u32>,
    pub presence_fails: bool,

    pub enumerations: AtomicU32,
    pub name_lookups: AtomicU32,
    pub terminations: AtomicU32,
    pub presence_checks: AtomicU32,
    pub check_times: Mutex<Vec<Instant>>,
}

impl FakePlatform {
    fn with_mode(mode: LookupMode) -> Self {
        Self {
            mode,
            ceiling: 0,
            table: String::new(),
            listener: None,
            enumerate_delay: Duration::ZERO,
            enumerate_fails: false,
            panic_port: None,
            names: HashMap::new(),
            name_lookup_fails: false,
            terminate_error: None,
            terminate_delay: Duration::ZERO,
            vanish_on_check: None,
            presence_fails: false,
            enumerations: AtomicU32::new(0),
            name_lookups: AtomicU32::new(0),
            terminations: AtomicU32::new(0),
            presence_checks: AtomicU32::new(0),
            check_times: Mutex::new(Vec::new()),
        }
    }

    /// Connection-table platform with the Windows system pid ceiling.
    pub fn table(table: &str) -> Self {
        Self {
            ceiling: 4,
            table: table.to_string(),
            ..Self::with_mode(LookupMode::ConnectionTable)
        }
    }

    /// Per-port platform reporting `name`/`pid` as the owner of every port.
    pub fn per_port(name: &str, pid: u32) -> Self {
        Self {
            listener: Some((name.to_string(), pid)),
            ..Self::with_mode(LookupMode::PerPort)
        }
    }

    pub fn enumerations(&self) -> u32 {
        self.enumerations.load(Ordering::SeqCst)
    }

    pub fn terminations(&self) -> u32 {
        self.terminations.load(Ordering::SeqCst)
    }

    pub fn presence_checks(&self) -> u32 {
        self.presence_checks.load(Ordering::SeqCst)
    }

    fn failure(program: &str) -> CommandError {
        CommandError::Exit {
            program: program.to_string(),
            status: "exit status: 1".to_string(),
            stderr: "scripted failure".to_string(),
        }
    }
}

impl ProcessPlatform for FakePlatform {
    fn lookup_mode(&self) -> LookupMode {
        self.mode
    }

    fn protected_pid_ceiling(&self) -> u32 {
        self.ceiling
    }

    async fn enumerate_connections(&self, port: u16) -> Result<String, CommandError> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        if self.panic_port == Some(port) {
            panic!("scripted fault on port {}", port);
        }
        if !self.enumerate_delay.is_zero() {
            tokio::time::sleep(self.enumerate_delay).await;
        }
        if self.enumerate_fails {
            return Err(Self::failure("enumerate"));
        }

        match (&self.mode, &self.listener) {
            (LookupMode::PerPort, Some((name, pid))) => Ok(format!(
                "COMMAND PID USER FD TYPE DEVICE SIZE/OFF NODE NAME\n\
                 {} {} me 3u IPv4 0x1 0t0 TCP 127.0.0.1:{} (LISTEN)\n",
                name, pid, port
            )),
            _ => Ok(self.table.clone()),
        }
    }

    async fn lookup_process_name(&self, pid: u32) -> Result<Option<String>, CommandError> {
        self.name_lookups.fetch_add(1, Ordering::SeqCst);
        if self.name_lookup_fails {
            return Err(Self::failure("tasklist"));
        }
        Ok(self.names.get(&pid).cloned())
    }

    async fn terminate(&self, _pid: u32) -> Result<(), CommandError> {
        self.terminations.fetch_add(1, Ordering::SeqCst);
        if !self.terminate_delay.is_zero() {
            tokio::time::sleep(self.terminate_delay).await;
        }
        match &self.terminate_error {
            Some(stderr) => Err(CommandError::Exit {
                program: "kill".to_string(),
                status: "exit status: 1".to_string(),
                stderr: stderr.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn is_running(&self, _pid: u32) -> Result<bool, CommandError> {
        let check = self.presence_checks.fetch_add(1, Ordering::SeqCst) + 1;
        self.check_times.lock().push(Instant::now());
        if self.presence_fails {
            return Err(Self::failure("ps"));
        }
        Ok(self.vanish_on_check.map_or(true, |n| check < n))
    }
}

/// Default configuration over an explicit range.
pub fn config(start: u16, end: u16) -> ScanConfig {
    ScanConfig {
        port_range_start: start,
        port_range_end: end,
        ..ScanConfig::default()
    }
}

pub fn engine(config: ScanConfig, platform: FakePlatform) -> (DevPortsEngine<FakePlatform>, Arc<FakePlatform>) {
    let platform = Arc::new(platform);
    let engine = DevPortsEngine::with_platform(config, Arc::clone(&platform)).unwrap();
    (engine, platform)
}
