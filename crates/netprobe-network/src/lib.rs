//! NetProbe Network - Port parsing, service naming and port scanning
//!
//! This crate provides the scan engine:
//! - Port specification parsing and the well-known port table
//! - Service naming (table, OS services database, fallback)
//! - Private-network advisory for scan targets
//! - Concurrent TCP connect scanning under a per-request worker pool

pub mod discovery;
pub mod port_scan;
pub mod ports;
pub mod service_detect;

pub use discovery::{is_private_address, resolve_host};
pub use port_scan::{
    PortProber, PortResult, PortScanConfig, PortScanner, ScanReport, TcpProber, MAX_WORKERS,
};
pub use ports::{parse_port_spec, well_known_ports, well_known_service, WELL_KNOWN_PORTS};
pub use service_detect::{ServiceDetector, ServiceResolver, SystemServiceResolver};
