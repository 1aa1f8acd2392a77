//! Configuration management for NetProbe components

use netprobe_core::{Error, Result};
use netprobe_network::{PortScanConfig, MAX_WORKERS};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Scan engine settings
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Per-client request limits on the scan endpoint
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {}", e)))
    }

    /// Create a configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Merge with environment variables (NETPROBE_ prefix)
    pub fn merge_env(mut self) -> Self {
        // Server settings
        if let Ok(val) = std::env::var("NETPROBE_BIND_ADDR") {
            if let Ok(addr) = val.parse() {
                self.server.bind_addr = addr;
            }
        }

        // Scanner settings
        if let Ok(val) = std::env::var("NETPROBE_MAX_PORTS") {
            if let Ok(n) = val.parse() {
                self.scanner.max_ports = n;
            }
        }
        if let Ok(val) = std::env::var("NETPROBE_SCAN_TIMEOUT_MS") {
            if let Ok(n) = val.parse() {
                self.scanner.timeout_ms = n;
            }
        }
        if let Ok(val) = std::env::var("NETPROBE_MAX_WORKERS") {
            if let Ok(n) = val.parse() {
                self.scanner.max_workers = n;
            }
        }

        // Rate limiting
        if let Ok(val) = std::env::var("NETPROBE_RATE_LIMIT") {
            if let Ok(n) = val.parse() {
                self.rate_limit.requests = n;
            }
        }

        // Logging
        if let Ok(val) = std::env::var("NETPROBE_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("NETPROBE_LOG_FORMAT") {
            self.logging.format = val;
        }

        self
    }

    /// Reject settings the scan engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.scanner.max_ports == 0 {
            return Err(invalid("scanner.max_ports", "must be at least 1"));
        }
        if self.scanner.max_workers == 0 {
            return Err(invalid("scanner.max_workers", "must be at least 1"));
        }
        if self.scanner.max_workers > MAX_WORKERS {
            return Err(Error::Configuration(format!(
                "scanner.max_workers: must be at most {}",
                MAX_WORKERS
            )));
        }
        if self.scanner.timeout_ms == 0 {
            return Err(invalid("scanner.timeout_ms", "must be greater than 0"));
        }
        if self.rate_limit.enabled && self.rate_limit.requests == 0 {
            return Err(invalid("rate_limit.requests", "must be at least 1"));
        }
        if self.rate_limit.enabled && self.rate_limit.window_seconds == 0 {
            return Err(invalid("rate_limit.window_seconds", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> Error {
    Error::Configuration(format!("{}: {}", key, message))
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Largest accepted request body
    #[serde(default = "default_max_body")]
    pub max_body_bytes: u64,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

fn default_max_body() -> u64 {
    16 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_body_bytes: default_max_body(),
        }
    }
}

/// Scan engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Maximum ports per request
    #[serde(default = "default_max_ports")]
    pub max_ports: usize,

    /// Per-probe connect timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Concurrent probes per request
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

fn default_max_ports() -> usize {
    200
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_max_workers() -> usize {
    50
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_ports: default_max_ports(),
            timeout_ms: default_timeout_ms(),
            max_workers: default_max_workers(),
        }
    }
}

impl ScannerConfig {
    /// Settings for the port scan engine
    pub fn scan_config(&self) -> PortScanConfig {
        PortScanConfig {
            timeout: Duration::from_millis(self.timeout_ms),
            max_workers: self.max_workers,
            max_ports: self.max_ports,
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Enforce the limit at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Requests allowed per window per client
    #[serde(default = "default_rate_requests")]
    pub requests: u32,

    /// Window length in seconds
    #[serde(default = "default_rate_window")]
    pub window_seconds: u64,
}

fn default_true() -> bool {
    true
}

fn default_rate_requests() -> u32 {
    10
}

fn default_rate_window() -> u64 {
    60
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests: default_rate_requests(),
            window_seconds: default_rate_window(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_log_format() -> String {
    String::from("pretty")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Builder for constructing Config
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.config.server.bind_addr = addr;
        self
    }

    pub fn max_ports(mut self, max: usize) -> Self {
        self.config.scanner.max_ports = max;
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.scanner.timeout_ms = ms;
        self
    }

    pub fn max_workers(mut self, workers: usize) -> Self {
        self.config.scanner.max_workers = workers;
        self
    }

    pub fn rate_limit(mut self, requests: u32, window_seconds: u64) -> Self {
        self.config.rate_limit.enabled = true;
        self.config.rate_limit.requests = requests;
        self.config.rate_limit.window_seconds = window_seconds;
        self
    }

    pub fn disable_rate_limit(mut self) -> Self {
        self.config.rate_limit.enabled = false;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
