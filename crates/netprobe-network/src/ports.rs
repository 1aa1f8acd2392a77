//! Port specifications and the well-known port table

use std::collections::{BTreeMap, BTreeSet};
use std::num::IntErrorKind;

use netprobe_core::{Error, Result};

/// Lowest scannable port
pub const MIN_PORT: i64 = 1;
/// Highest scannable port
pub const MAX_PORT: i64 = 65535;

/// Well-known TCP ports and the label reported for them, sorted by port.
pub const WELL_KNOWN_PORTS: &[(u16, &str)] = &[
    (21, "FTP"),
    (22, "SSH"),
    (23, "Telnet"),
    (25, "SMTP"),
    (53, "DNS"),
    (80, "HTTP"),
    (110, "POP3"),
    (115, "SFTP"),
    (135, "RPC"),
    (139, "NetBIOS"),
    (143, "IMAP"),
    (194, "IRC"),
    (443, "SSL"),
    (445, "SMB"),
    (993, "IMAPS"),
    (995, "POP3S"),
    (1433, "MSSQL"),
    (3306, "MySQL"),
    (3389, "Remote Desktop"),
    (5632, "PCAnywhere"),
    (5900, "VNC"),
    (25665, "Minecraft"),
];

/// Look up the label for a well-known port
pub fn well_known_service(port: u16) -> Option<&'static str> {
    WELL_KNOWN_PORTS
        .binary_search_by_key(&port, |&(p, _)| p)
        .ok()
        .map(|idx| WELL_KNOWN_PORTS[idx].1)
}

/// Every port in the well-known table, ascending
pub fn well_known_ports() -> Vec<u16> {
    WELL_KNOWN_PORTS.iter().map(|&(port, _)| port).collect()
}

/// The well-known table keyed by port
pub fn well_known_table() -> BTreeMap<u16, &'static str> {
    WELL_KNOWN_PORTS.iter().copied().collect()
}

/// Parse a port specification string.
///
/// Supports: "80", "80,443", "1-1024", "80,443,8000-9000".
///
/// Syntax errors abort the whole parse, naming the offending token. Values
/// outside 1-65535 are dropped silently, as is any range not wholly inside
/// that interval. The result is ascending with no duplicates; the per-request
/// port cap is the caller's to enforce.
pub fn parse_port_spec(spec: &str) -> Result<Vec<u16>> {
    let mut ports = BTreeSet::new();

    for part in spec.split(',') {
        let part = part.trim();
        if part.contains('-') {
            let bounds: Vec<&str> = part.split('-').collect();
            if bounds.len() != 2 {
                return Err(Error::invalid_range(part));
            }
            let (start, end) = match (parse_number(bounds[0]), parse_number(bounds[1])) {
                (Some(start), Some(end)) if start <= end => (start, end),
                _ => return Err(Error::invalid_range(part)),
            };
            if MIN_PORT <= start && end <= MAX_PORT {
                ports.extend((start as u16)..=(end as u16));
            }
        } else {
            let port = parse_number(part).ok_or_else(|| Error::invalid_port(part))?;
            if (MIN_PORT..=MAX_PORT).contains(&port) {
                ports.insert(port as u16);
            }
        }
    }

    Ok(ports.into_iter().collect())
}

/// Parse a decimal integer, saturating values too large to represent so
/// they are filtered as out of range rather than rejected as malformed.
fn parse_number(s: &str) -> Option<i64> {
    match s.trim().parse::<i64>() {
        Ok(n) => Some(n),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_spec_single() {
        assert_eq!(parse_port_spec("80").unwrap(), vec![80]);
    }

    #[test]
    fn test_parse_port_spec_list_is_sorted() {
        assert_eq!(parse_port_spec("80,443,22").unwrap(), vec![22, 80, 443]);
    }

    #[test]
    fn test_parse_port_spec_range() {
        assert_eq!(parse_port_spec("20-22").unwrap(), vec![20, 21, 22]);
    }

    #[test]
    fn test_parse_port_spec_mixed_with_whitespace() {
        let ports = parse_port_spec(" 22, 80 ,8000 - 8002").unwrap();
        assert_eq!(ports, vec![22, 80, 8000, 8001, 8002]);
    }

    #[test]
    fn test_parse_port_spec_dedup() {
        let ports = parse_port_spec("80,80,79-81,443").unwrap();
        assert_eq!(ports, vec![79, 80, 81, 443]);
    }

    #[test]
    fn test_out_of_range_is_dropped_not_rejected() {
        assert_eq!(parse_port_spec("70000").unwrap(), Vec::<u16>::new());
        assert_eq!(parse_port_spec("0,22").unwrap(), vec![22]);
        assert_eq!(
            parse_port_spec("99999999999999999999999").unwrap(),
            Vec::<u16>::new()
        );
    }

    #[test]
    fn test_range_outside_bounds_is_dropped() {
        for spec in ["0-2", "0-5", "65533-70000", "1-70000", "70000-80000"] {
            assert_eq!(parse_port_spec(spec).unwrap(), Vec::<u16>::new(), "{}", spec);
        }
        assert_eq!(parse_port_spec("0-2,22").unwrap(), vec![22]);
        assert_eq!(
            parse_port_spec("65533-65535").unwrap(),
            vec![65533, 65534, 65535]
        );
    }

    #[test]
    fn test_non_numeric_is_rejected() {
        let err = parse_port_spec("abc").unwrap_err();
        assert_eq!(err.to_string(), "Invalid port: abc");

        let err = parse_port_spec("80,abc").unwrap_err();
        assert!(err.to_string().contains("abc"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_malformed_ranges_are_rejected() {
        for spec in ["30-20", "10-x", "1-2-3", "-5", "5-", "-"] {
            let err = parse_port_spec(spec).unwrap_err();
            assert_eq!(err.to_string(), format!("Invalid port range: {}", spec));
        }
    }

    #[test]
    fn test_empty_token_is_rejected() {
        assert!(parse_port_spec("80,").is_err());
        assert!(parse_port_spec("").is_err());
    }

    #[test]
    fn test_output_is_strictly_ascending_and_in_bounds() {
        let ports = parse_port_spec("9000-9010,1,65535,70000,5,5,9005,0").unwrap();
        assert!(ports.windows(2).all(|w| w[0] < w[1]));
        assert!(ports.iter().all(|&p| p >= 1));
        assert_eq!(ports.first(), Some(&1));
        assert_eq!(ports.last(), Some(&65535));
    }

    #[test]
    fn test_well_known_table() {
        assert!(WELL_KNOWN_PORTS.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(well_known_service(22), Some("SSH"));
        assert_eq!(well_known_service(3389), Some("Remote Desktop"));
        assert_eq!(well_known_service(9999), None);
        assert_eq!(well_known_ports().len(), WELL_KNOWN_PORTS.len());
        assert_eq!(well_known_table().get(&25665), Some(&"Minecraft"));
    }
}
