//! DevPorts engine: the single entry point shells use.
//!
//! Wires one validated [`ScanConfig`], one host platform and one shared
//! [`ResolutionCache`] into the scanner, resolver and killer.

use std::sync::Arc;

use crate::adapters::HostPlatform;
use crate::config::ScanConfig;
use crate::domain::{PortRecord, ProcessOwner};
use crate::error::Result;
use crate::killer::ProcessKiller;
use crate::ports::ProcessPlatform;
use crate::resolver::{ResolutionCache, Resolver};
use crate::scanner::PortScanner;

/// Scans loopback ports and kills their owners.
///
/// Cheap to share behind an `Arc`; every operation takes `&self`.
pub struct DevPortsEngine<P: ProcessPlatform = HostPlatform> {
    config: ScanConfig,
    cache: Arc<ResolutionCache>,
    resolver: Arc<Resolver<P>>,
    scanner: PortScanner<P>,
    killer: ProcessKiller<P>,
}

impl DevPortsEngine<HostPlatform> {
    /// Create an engine for the running operating system.
    pub fn new(config: ScanConfig) -> Result<Self> {
        Self::with_platform(config, Arc::new(HostPlatform::detect()))
    }
}

impl<P: ProcessPlatform> DevPortsEngine<P> {
    /// Create an engine on an explicit platform.
    pub fn with_platform(config: ScanConfig, platform: Arc<P>) -> Result<Self> {
        config.validate()?;

        let cache = Arc::new(ResolutionCache::new(config.cache_ttl()));
        let resolver = Arc::new(Resolver::new(
            Arc::clone(&platform),
            Arc::clone(&cache),
            config.command_timeout(),
        ));
        let scanner = PortScanner::new(&config, Arc::clone(&resolver))?;
        let killer = ProcessKiller::new(&config, platform, Arc::clone(&cache));

        Ok(Self {
            config,
            cache,
            resolver,
            scanner,
            killer,
        })
    }

    /// Open ports in the configured range with their owners, ascending.
    pub async fn scan(&self) -> Vec<PortRecord> {
        self.scanner.scan().await
    }

    /// Kill a process by its textual identifier and verify it exited.
    pub async fn kill(&self, process_id: &str) -> Result<()> {
        self.killer.kill(process_id).await
    }

    /// Owner of a single port, without probing it first.
    pub async fn resolve(&self, port: u16) -> ProcessOwner {
        self.resolver.resolve(port).await
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_rejects_invalid_config() {
        let config = ScanConfig {
            port_range_start: 100,
            port_range_end: 10,
            ..ScanConfig::default()
        };
        assert!(matches!(DevPortsEngine::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_shared_cache_ttl() {
        let config = ScanConfig {
            cache_ttl_ms: 750,
            ..ScanConfig::default()
        };
        let engine = DevPortsEngine::new(config).unwrap();
        assert_eq!(engine.cache().ttl(), std::time::Duration::from_millis(750));
        assert_eq!(engine.config().cache_ttl_ms, 750);
    }
}
