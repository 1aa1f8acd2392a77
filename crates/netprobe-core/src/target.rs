//! Scan target definitions and host validation

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// Dotted labels ending in an alphabetic label of two or more characters.
const HOSTNAME_PATTERN: &str = r"^[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

fn hostname_regex() -> &'static Regex {
    static HOSTNAME: OnceLock<Regex> = OnceLock::new();
    HOSTNAME.get_or_init(|| Regex::new(HOSTNAME_PATTERN).expect("hostname pattern is valid"))
}

/// Check whether `host` is an acceptable scan target.
///
/// Accepts IPv4/IPv6 literals and anything that looks like a hostname with a
/// TLD-like suffix. No resolution happens here; a well-formed but unknown
/// name passes and simply yields closed ports later.
pub fn validate_host(host: &str) -> bool {
    host.parse::<IpAddr>().is_ok() || hostname_regex().is_match(host)
}

/// A validated target to scan
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ScanTarget {
    /// Single IP address
    Ip(IpAddr),

    /// Hostname (e.g., "server.example.com")
    Hostname(String),
}

impl ScanTarget {
    /// Parse and validate a target string.
    ///
    /// Surrounding whitespace is ignored. Empty input and strings failing
    /// [`validate_host`] are rejected with a validation error.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() {
            return Err(Error::validation("Domain/IP is required"));
        }

        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(ScanTarget::Ip(ip));
        }

        if validate_host(s) {
            return Ok(ScanTarget::Hostname(s.to_string()));
        }

        Err(Error::validation("Invalid domain or IP address"))
    }

    /// The host string as it should be echoed and dialled
    pub fn host(&self) -> String {
        match self {
            ScanTarget::Ip(ip) => ip.to_string(),
            ScanTarget::Hostname(host) => host.clone(),
        }
    }
}

impl std::fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.host())
    }
}
