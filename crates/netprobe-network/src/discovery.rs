//! Target resolution and the private-network advisory
//!
//! Scanning an address on a private network is allowed; it is only logged.

use netprobe_core::{Error, Result};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use tokio::net::lookup_host;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Resolve `host` to its first address.
///
/// IP literals are returned without a lookup.
pub async fn resolve_host(host: &str, limit: Duration) -> Result<IpAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    let failed = || Error::DnsResolutionFailed {
        hostname: host.to_string(),
    };

    let mut addrs = timeout(limit, lookup_host((host, 0)))
        .await
        .map_err(|_| failed())?
        .map_err(|_| failed())?;

    addrs.next().map(|addr| addr.ip()).ok_or_else(failed)
}

/// Whether an address belongs to a private, loopback, link-local or
/// otherwise non-public range
pub fn is_private_address(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_private_v4(v4),
            None => is_private_v6(v6),
        },
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
        // 2001:db8::/32 documentation
        || (first == 0x2001 && ip.segments()[1] == 0x0db8)
}

/// Log a warning when `host` resolves to a private address.
///
/// Returns the resolved address for callers that want it. Resolution
/// failure yields `None` and is otherwise ignored.
pub async fn warn_if_private(host: &str, limit: Duration) -> Option<IpAddr> {
    match resolve_host(host, limit).await {
        Ok(ip) => {
            if is_private_address(ip) {
                warn!(host = %host, ip = %ip, "Scanning private IP");
            } else {
                debug!(host = %host, ip = %ip, "Target resolves to a public address");
            }
            Some(ip)
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_v4() {
        for ip in ["10.1.2.3", "172.16.0.1", "192.168.1.1", "127.0.0.1", "169.254.1.1", "0.0.0.0"] {
            assert!(is_private_address(ip.parse().unwrap()), "{} should be private", ip);
        }
        for ip in ["8.8.8.8", "1.1.1.1", "172.32.0.1"] {
            assert!(!is_private_address(ip.parse().unwrap()), "{} should be public", ip);
        }
    }

    #[test]
    fn test_private_v6() {
        for ip in ["::1", "fd00::1", "fe80::1", "::ffff:192.168.0.1"] {
            assert!(is_private_address(ip.parse().unwrap()), "{} should be private", ip);
        }
        assert!(!is_private_address("2606:4700:4700::1111".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_resolve_literal_skips_lookup() {
        let ip = resolve_host("192.168.10.20", Duration::from_millis(1)).await.unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::new(192, 168, 10, 20)));
    }

    #[tokio::test]
    async fn test_resolution_failure_is_swallowed() {
        // .invalid is reserved and never resolves
        let resolved = warn_if_private("no-such-host.invalid", Duration::from_secs(2)).await;
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_warn_if_private_returns_address() {
        let resolved = warn_if_private("127.0.0.1", Duration::from_secs(1)).await;
        assert_eq!(resolved, Some(IpAddr::V4(Ipv4Addr::LOCALHOST)));
    }
}
