//! Port scanning - TCP connect probes fanned out over a bounded worker pool
//!
//! Each request gets its own [`Semaphore`]; a port is probed once, with no
//! retries, and the report is always sorted by port regardless of the order
//! probes complete in.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use netprobe_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, trace};

use crate::discovery;
use crate::service_detect::ServiceDetector;

/// Result of probing a single port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortResult {
    /// Port number
    pub port: u16,
    /// Whether the TCP handshake completed
    pub open: bool,
    /// Display name of the service
    pub service: String,
}

impl PortResult {
    pub fn open(port: u16, service: impl Into<String>) -> Self {
        Self {
            port,
            open: true,
            service: service.into(),
        }
    }

    pub fn closed(port: u16, service: impl Into<String>) -> Self {
        Self {
            port,
            open: false,
            service: service.into(),
        }
    }
}

/// Aggregated, sorted results for one scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Target as supplied by the caller
    pub host: String,
    pub scanned_ports_count: usize,
    pub open_ports_count: usize,
    /// One entry per scanned port, ascending by port
    pub results: Vec<PortResult>,
}

impl ScanReport {
    /// Build a report, sorting the results by port
    pub fn new(host: impl Into<String>, mut results: Vec<PortResult>) -> Self {
        results.sort_by_key(|r| r.port);
        let open_ports_count = results.iter().filter(|r| r.open).count();
        Self {
            host: host.into(),
            scanned_ports_count: results.len(),
            open_ports_count,
            results,
        }
    }

    /// Iterate over the open ports only
    pub fn open_ports(&self) -> impl Iterator<Item = &PortResult> {
        self.results.iter().filter(|r| r.open)
    }
}

/// Largest worker pool a scan can use
pub const MAX_WORKERS: usize = Semaphore::MAX_PERMITS;

/// Port scanner configuration
#[derive(Debug, Clone)]
pub struct PortScanConfig {
    /// Timeout per port
    pub timeout: Duration,
    /// Maximum concurrent probes per request, clamped to 1..=[`MAX_WORKERS`]
    pub max_workers: usize,
    /// Maximum ports per request
    pub max_ports: usize,
}

impl Default for PortScanConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            max_workers: 50,
            max_ports: 200,
        }
    }
}

/// One connection attempt against one port
#[async_trait]
pub trait PortProber: Send + Sync + 'static {
    /// Probe `host:port`. Connection failures are results, never errors.
    async fn probe(&self, host: &str, port: u16) -> PortResult;
}

/// TCP connect prober - completes the handshake and closes immediately
#[derive(Debug, Clone)]
pub struct TcpProber {
    timeout: Duration,
    services: ServiceDetector,
}

impl TcpProber {
    pub fn new(timeout: Duration) -> Self {
        Self::with_services(timeout, ServiceDetector::new())
    }

    pub fn with_services(timeout: Duration, services: ServiceDetector) -> Self {
        Self { timeout, services }
    }
}

#[async_trait]
impl PortProber for TcpProber {
    async fn probe(&self, host: &str, port: u16) -> PortResult {
        let start = Instant::now();

        trace!("TCP connect probe {}:{}", host, port);

        match timeout(self.timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => {
                drop(stream);
                debug!("Port {}:{} is open ({:?})", host, port, start.elapsed());
                PortResult::open(port, self.services.open_port_service(port).await)
            }
            Ok(Err(e)) => {
                trace!("Port {}:{} closed: {}", host, port, e);
                PortResult::closed(port, self.services.closed_port_service(port))
            }
            Err(_) => {
                trace!("Port {}:{} timeout", host, port);
                PortResult::closed(port, self.services.closed_port_service(port))
            }
        }
    }
}

/// Port scanner engine
pub struct PortScanner<P = TcpProber> {
    config: PortScanConfig,
    prober: Arc<P>,
}

impl PortScanner<TcpProber> {
    /// Create a new port scanner with default configuration
    pub fn new() -> Self {
        Self::with_config(PortScanConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(config: PortScanConfig) -> Self {
        let prober = TcpProber::new(config.timeout);
        Self::with_prober(config, prober)
    }
}

impl Default for PortScanner<TcpProber> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PortProber> PortScanner<P> {
    /// Create with a custom prober
    pub fn with_prober(config: PortScanConfig, prober: P) -> Self {
        Self {
            config,
            prober: Arc::new(prober),
        }
    }

    pub fn config(&self) -> &PortScanConfig {
        &self.config
    }

    pub fn prober(&self) -> &P {
        &self.prober
    }

    /// Scan `ports` on `host` and return the sorted report.
    ///
    /// Fails before any network activity if more than `max_ports` ports are
    /// requested. At most `max_workers` probes are in flight; the rest wait
    /// for a permit. Every dispatched probe is awaited.
    pub async fn scan(&self, host: &str, ports: &[u16]) -> Result<ScanReport> {
        if ports.len() > self.config.max_ports {
            return Err(Error::TooManyPorts {
                requested: ports.len(),
                max: self.config.max_ports,
            });
        }

        discovery::warn_if_private(host, self.config.timeout).await;

        let started = Instant::now();
        let host: Arc<str> = Arc::from(host);
        let workers = self.config.max_workers.clamp(1, MAX_WORKERS);
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut probes = JoinSet::new();

        debug!(
            "Dispatching {} probes against {} with {} workers",
            ports.len(),
            host,
            workers
        );

        for &port in ports {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| Error::Internal(format!("worker pool closed: {}", e)))?;
            let prober = Arc::clone(&self.prober);
            let host = Arc::clone(&host);

            probes.spawn(async move {
                let result = prober.probe(&host, port).await;
                drop(permit);
                result
            });
        }

        // Returning early drops the set, which aborts the probes still running
        let mut results = Vec::with_capacity(ports.len());
        while let Some(joined) = probes.join_next().await {
            let result =
                joined.map_err(|e| Error::Internal(format!("probe task failed: {}", e)))?;
            results.push(result);
        }

        let report = ScanReport::new(&*host, results);
        info!(
            "Scanned {} ports on {} in {:?}: {} open",
            report.scanned_ports_count,
            report.host,
            started.elapsed(),
            report.open_ports_count
        );

        Ok(report)
    }
}
