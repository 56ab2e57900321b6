//! Concurrent scan of a loopback port range.
//!
//! A fixed pool of workers pulls ports from a bounded job channel, probes
//! each one and resolves the owner of every open port. Records flow through
//! an unbounded channel to a single collector; the final list is sorted by
//! port.

mod probe;

pub use probe::Prober;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::ScanConfig;
use crate::domain::PortRecord;
use crate::error::Result;
use crate::ports::ProcessPlatform;
use crate::resolver::Resolver;

type JobQueue = Arc<Mutex<mpsc::Receiver<u16>>>;

/// Scans `[start, end]` with a pool of workers.
pub struct PortScanner<P: ProcessPlatform> {
    start: u16,
    end: u16,
    port_count: usize,
    workers: usize,
    prober: Prober,
    resolver: Arc<Resolver<P>>,
}

impl<P: ProcessPlatform> PortScanner<P> {
    /// Build a scanner; fails if `config` has an empty range or no workers.
    pub fn new(config: &ScanConfig, resolver: Arc<Resolver<P>>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            start: config.port_range_start,
            end: config.port_range_end,
            port_count: config.port_count(),
            workers: config.num_workers,
            prober: Prober::new(config.probe_timeout()),
            resolver,
        })
    }

    /// Probe every port in the range and return the open ones, ascending.
    ///
    /// Never fails: unresolvable owners are reported as sentinels and a
    /// port whose processing panics is left out.
    pub async fn scan(&self) -> Vec<PortRecord> {
        let started = Instant::now();

        let (job_tx, job_rx) = mpsc::channel::<u16>(self.port_count);
        let jobs: JobQueue = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<PortRecord>();

        let records = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let collector = {
            let records = Arc::clone(&records);
            tokio::spawn(async move {
                while let Some(record) = result_rx.recv().await {
                    records.lock().push(record);
                }
            })
        };

        let mut handles = Vec::with_capacity(self.workers);
        for id in 0..self.workers {
            handles.push(tokio::spawn(worker(
                id,
                Arc::clone(&jobs),
                result_tx.clone(),
                self.prober,
                Arc::clone(&self.resolver),
            )));
        }

        for port in self.start..=self.end {
            // Capacity covers the whole range, so this never waits
            if job_tx.send(port).await.is_err() {
                break;
            }
        }
        drop(job_tx);

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Scan worker terminated abnormally");
            }
        }
        drop(result_tx);

        if let Err(e) = collector.await {
            warn!(error = %e, "Scan collector terminated abnormally");
        }

        let mut records = std::mem::take(&mut *records.lock());
        records.sort_by_key(|record| record.port);

        debug!(
            start = self.start,
            end = self.end,
            workers = self.workers,
            open = records.len(),
            elapsed = ?started.elapsed(),
            "Scan complete"
        );
        records
    }
}

async fn worker<P: ProcessPlatform>(
    id: usize,
    jobs: JobQueue,
    results: mpsc::UnboundedSender<PortRecord>,
    prober: Prober,
    resolver: Arc<Resolver<P>>,
) {
    loop {
        let next = jobs.lock().await.recv().await;
        let Some(port) = next else {
            break;
        };

        match AssertUnwindSafe(scan_port(port, &prober, &resolver))
            .catch_unwind()
            .await
        {
            Ok(Some(record)) => {
                // The collector outlives every worker
                let _ = results.send(record);
            }
            Ok(None) => {}
            Err(panic) => {
                warn!(
                    worker = id,
                    port = port,
                    panic = panic_message(panic.as_ref()),
                    "Port processing panicked, port skipped"
                );
            }
        }
    }
}

async fn scan_port<P: ProcessPlatform>(
    port: u16,
    prober: &Prober,
    resolver: &Resolver<P>,
) -> Option<PortRecord> {
    if !prober.probe(port).await {
        return None;
    }
    let owner = resolver.resolve(port).await;
    debug!(port = port, owner = ?owner, "Open port");
    Some(PortRecord::active(port, owner))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "non-string panic payload"
    }
}
