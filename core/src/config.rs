//! Scan configuration and its on-disk store.
//!
//! Stores configuration in JSON format at `~/.devports/config.json`.
//! Every key is optional; missing keys take their defaults.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

/// Upper bound on the worker pool size.
pub const MAX_WORKERS: usize = 10_000;

/// Shortest auto-rescan interval a shell may use.
pub const MIN_AUTO_REFRESH_SECS: u64 = 10;

/// Parameters for scanning and killing.
///
/// Validated once when the engine is built and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanConfig {
    /// First port to probe (inclusive).
    #[serde(default = "default_port_range_start")]
    pub port_range_start: u16,

    /// Last port to probe (inclusive).
    #[serde(default = "default_port_range_end")]
    pub port_range_end: u16,

    /// Number of concurrent probe workers.
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,

    /// Connect timeout per probe, in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Deadline for every external command, in milliseconds.
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,

    /// Number of presence checks after a kill.
    #[serde(default = "default_kill_verify_attempts")]
    pub kill_verify_attempts: u32,

    /// Base delay of the linear verification back-off, in milliseconds.
    #[serde(default = "default_kill_verify_base_delay_ms")]
    pub kill_verify_base_delay_ms: u64,

    /// How long a shell waits after a kill before rescanning, in milliseconds.
    #[serde(default = "default_post_kill_settle_delay_ms")]
    pub post_kill_settle_delay_ms: u64,

    /// Auto-rescan interval used by shells, in seconds.
    #[serde(default = "default_auto_refresh_interval_secs")]
    pub auto_refresh_interval_secs: u64,

    /// Lifetime of a cached connection table, in milliseconds.
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,
}

fn default_port_range_start() -> u16 {
    1
}

fn default_port_range_end() -> u16 {
    9999
}

fn default_num_workers() -> usize {
    500
}

fn default_probe_timeout_ms() -> u64 {
    100
}

fn default_command_timeout_ms() -> u64 {
    5000
}

fn default_kill_verify_attempts() -> u32 {
    5
}

fn default_kill_verify_base_delay_ms() -> u64 {
    200
}

fn default_post_kill_settle_delay_ms() -> u64 {
    1500
}

fn default_auto_refresh_interval_secs() -> u64 {
    300
}

fn default_cache_ttl_ms() -> u64 {
    2000
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            port_range_start: default_port_range_start(),
            port_range_end: default_port_range_end(),
            num_workers: default_num_workers(),
            probe_timeout_ms: default_probe_timeout_ms(),
            command_timeout_ms: default_command_timeout_ms(),
            kill_verify_attempts: default_kill_verify_attempts(),
            kill_verify_base_delay_ms: default_kill_verify_base_delay_ms(),
            post_kill_settle_delay_ms: default_post_kill_settle_delay_ms(),
            auto_refresh_interval_secs: default_auto_refresh_interval_secs(),
            cache_ttl_ms: default_cache_ttl_ms(),
        }
    }
}

impl ScanConfig {
    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if self.port_range_start == 0 {
            return Err(Error::Config(format!(
                "invalid portRangeStart: {} (must be 1-65535)",
                self.port_range_start
            )));
        }
        if self.port_range_end == 0 {
            return Err(Error::Config(format!(
                "invalid portRangeEnd: {} (must be 1-65535)",
                self.port_range_end
            )));
        }
        if self.port_range_end < self.port_range_start {
            return Err(Error::Config(format!(
                "portRangeEnd ({}) must be >= portRangeStart ({})",
                self.port_range_end, self.port_range_start
            )));
        }

        if self.num_workers == 0 || self.num_workers > MAX_WORKERS {
            return Err(Error::Config(format!(
                "invalid numWorkers: {} (must be 1-{})",
                self.num_workers, MAX_WORKERS
            )));
        }

        if self.probe_timeout_ms == 0 {
            return Err(Error::Config("invalid probeTimeoutMs: 0 (must be > 0)".into()));
        }
        if self.command_timeout_ms == 0 {
            return Err(Error::Config("invalid commandTimeoutMs: 0 (must be > 0)".into()));
        }

        if self.kill_verify_attempts == 0 {
            return Err(Error::Config(
                "invalid killVerifyAttempts: 0 (must be >= 1)".into(),
            ));
        }
        if self.kill_verify_base_delay_ms == 0 {
            return Err(Error::Config(
                "invalid killVerifyBaseDelayMs: 0 (must be > 0)".into(),
            ));
        }

        if self.auto_refresh_interval_secs < MIN_AUTO_REFRESH_SECS {
            return Err(Error::Config(format!(
                "invalid autoRefreshIntervalSecs: {} (must be >= {})",
                self.auto_refresh_interval_secs, MIN_AUTO_REFRESH_SECS
            )));
        }

        if self.cache_ttl_ms == 0 {
            return Err(Error::Config("invalid cacheTtlMs: 0 (must be > 0)".into()));
        }

        Ok(())
    }

    /// Number of ports in the configured range.
    pub fn port_count(&self) -> usize {
        usize::from(self.port_range_end).saturating_sub(usize::from(self.port_range_start)) + 1
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn kill_verify_base_delay(&self) -> Duration {
        Duration::from_millis(self.kill_verify_base_delay_ms)
    }

    pub fn post_kill_settle_delay(&self) -> Duration {
        Duration::from_millis(self.post_kill_settle_delay_ms)
    }

    pub fn auto_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.auto_refresh_interval_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}

/// Configuration store for reading and writing [`ScanConfig`].
///
/// Handles reading and writing configuration to `~/.devports/config.json`.
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.devports/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        let config_path = home.join(".devports").join("config.json");

        Ok(Self { config_path })
    }

    /// Create a config store with a custom path.
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Path of the configuration file.
    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk.
    ///
    /// Returns the default config if the file doesn't exist. The result is
    /// not validated; the engine validates it on construction.
    pub async fn load(&self) -> Result<ScanConfig> {
        if !self.config_path.exists() {
            return Ok(ScanConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, config: &ScanConfig) -> Result<()> {
        if let Some(config_dir) = self.config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir).await.map_err(|e| {
                    Error::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(config)?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_store() -> (ConfigStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        (ConfigStore::with_path(path), dir)
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.port_count(), 9999);
    }

    #[test]
    fn test_single_port_range() {
        let config = ScanConfig {
            port_range_start: 8080,
            port_range_end: 8080,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.port_count(), 1);
    }

    #[test]
    fn test_invalid_ranges() {
        let config = ScanConfig {
            port_range_start: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ScanConfig {
            port_range_start: 100,
            port_range_end: 99,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("portRangeEnd"));
    }

    #[test]
    fn test_invalid_workers() {
        for workers in [0, MAX_WORKERS + 1] {
            let config = ScanConfig {
                num_workers: workers,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "workers={}", workers);
        }

        let config = ScanConfig {
            num_workers: MAX_WORKERS,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_timings() {
        let cases = [
            ScanConfig {
                probe_timeout_ms: 0,
                ..Default::default()
            },
            ScanConfig {
                command_timeout_ms: 0,
                ..Default::default()
            },
            ScanConfig {
                kill_verify_attempts: 0,
                ..Default::default()
            },
            ScanConfig {
                kill_verify_base_delay_ms: 0,
                ..Default::default()
            },
            ScanConfig {
                auto_refresh_interval_secs: 9,
                ..Default::default()
            },
            ScanConfig {
                cache_ttl_ms: 0,
                ..Default::default()
            },
        ];

        for config in cases {
            assert!(config.validate().is_err(), "{:?}", config);
        }

        // A zero settle delay is allowed
        let config = ScanConfig {
            post_kill_settle_delay_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_nonexistent() {
        let (store, _dir) = test_store();
        let config = store.load().await.unwrap();
        assert_eq!(config, ScanConfig::default());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (store, _dir) = test_store();

        let config = ScanConfig {
            port_range_start: 3000,
            port_range_end: 3999,
            num_workers: 64,
            ..Default::default()
        };
        store.save(&config).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, config);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let (store, _dir) = test_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), r#"{ "portRangeEnd": 1024, "numWorkers": 8 }"#).unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.port_range_start, 1);
        assert_eq!(loaded.port_range_end, 1024);
        assert_eq!(loaded.num_workers, 8);
        assert_eq!(loaded.command_timeout_ms, 5000);
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let (store, _dir) = test_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), r#"{ "portRangeEnd": 70000 }"#).unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
