//! Request and response bodies for the HTTP API

use std::collections::BTreeMap;

use netprobe_core::{Error, Result, ScanTarget};
use netprobe_network::{parse_port_spec, ports::well_known_table, well_known_ports};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /scan`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// IP literal or hostname
    #[serde(default)]
    pub host: Option<String>,
    /// Comma separated ports and `start-end` ranges
    #[serde(default)]
    pub ports: Option<String>,
    /// Scan the well-known port table instead of `ports`
    #[serde(default)]
    pub scan_all_common: bool,
}

/// A validated request, ready to hand to the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPlan {
    /// Trimmed host exactly as the caller sent it
    pub host: String,
    pub target: ScanTarget,
    /// Ascending, deduplicated; not yet checked against the port cap
    pub ports: Vec<u16>,
}

impl ScanRequest {
    /// Decode a raw request body.
    ///
    /// An empty body, `null`, `{}` and other empty JSON values count as no
    /// data at all.
    pub fn from_body(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(no_data());
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|_| Error::validation("Request body must be valid JSON"))?;

        match value {
            Value::Object(map) if !map.is_empty() => serde_json::from_value(Value::Object(map))
                .map_err(|e| Error::validation(format!("Invalid request body: {}", e))),
            v if is_empty_value(&v) => Err(no_data()),
            _ => Err(Error::validation("Request body must be a JSON object")),
        }
    }

    /// Validate the host and work out which ports to scan.
    ///
    /// Checks run in order: host present, host valid, port selection. The
    /// well-known table wins over an explicit `ports` string.
    pub fn plan(&self) -> Result<ScanPlan> {
        let host = self.host.as_deref().unwrap_or_default().trim();
        let target = ScanTarget::parse(host)?;

        let ports = if self.scan_all_common {
            well_known_ports()
        } else {
            match self.ports.as_deref().map(str::trim) {
                Some(spec) if !spec.is_empty() => parse_port_spec(spec)?,
                _ => return Err(Error::validation("No ports specified")),
            }
        };

        Ok(ScanPlan {
            host: host.to_string(),
            target,
            ports,
        })
    }
}

fn no_data() -> Error {
    Error::validation("No JSON data provided")
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}

/// Body of every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Body of `GET /common-ports`
#[derive(Debug, Clone, Serialize)]
pub struct CommonPortsResponse {
    /// Keys serialize as strings
    pub common_ports: BTreeMap<u16, &'static str>,
}

impl CommonPortsResponse {
    pub fn new() -> Self {
        Self {
            common_ports: well_known_table(),
        }
    }
}

impl Default for CommonPortsResponse {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netprobe_network::WELL_KNOWN_PORTS;

    fn request(json: &str) -> Result<ScanPlan> {
        ScanRequest::from_body(json.as_bytes())?.plan()
    }

    #[test]
    fn test_empty_bodies_have_no_data() {
        for body in ["", "  \n", "null", "{}", "[]", "false", "\"\""] {
            let err = ScanRequest::from_body(body.as_bytes()).unwrap_err();
            assert_eq!(err.to_string(), "No JSON data provided", "body {:?}", body);
        }
    }

    #[test]
    fn test_malformed_bodies() {
        let err = ScanRequest::from_body(b"{not json").unwrap_err();
        assert_eq!(err.to_string(), "Request body must be valid JSON");

        let err = ScanRequest::from_body(b"[1, 2]").unwrap_err();
        assert_eq!(err.to_string(), "Request body must be a JSON object");

        let err = ScanRequest::from_body(br#"{"host": 42}"#).unwrap_err();
        assert!(err.to_string().starts_with("Invalid request body"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_plan_explicit_ports() {
        let plan = request(r#"{"host": " 127.0.0.1 ", "ports": "443, 80,22"}"#).unwrap();
        assert_eq!(plan.host, "127.0.0.1");
        assert_eq!(plan.ports, vec![22, 80, 443]);
    }

    #[test]
    fn test_plan_host_errors() {
        let err = request(r#"{"ports": "80"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Domain/IP is required");

        let err = request(r#"{"host": "   ", "ports": "80"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Domain/IP is required");

        let err = request(r#"{"host": "not a host", "ports": "80"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Invalid domain or IP address");
    }

    #[test]
    fn test_host_checked_before_ports() {
        let err = request(r#"{"host": "bad host", "ports": "abc"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Invalid domain or IP address");
    }

    #[test]
    fn test_plan_port_errors() {
        let err = request(r#"{"host": "example.com"}"#).unwrap_err();
        assert_eq!(err.to_string(), "No ports specified");

        let err = request(r#"{"host": "example.com", "ports": "  "}"#).unwrap_err();
        assert_eq!(err.to_string(), "No ports specified");

        let err = request(r#"{"host": "example.com", "ports": "80,abc"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Invalid port: abc");
    }

    #[test]
    fn test_scan_all_common_overrides_ports() {
        let plan =
            request(r#"{"host": "example.com", "ports": "abc", "scan_all_common": true}"#).unwrap();
        assert_eq!(plan.ports.len(), WELL_KNOWN_PORTS.len());

        let plan = request(r#"{"host": "example.com", "scan_all_common": true}"#).unwrap();
        assert_eq!(plan.ports, well_known_ports());
    }

    #[test]
    fn test_common_ports_response_shape() {
        let json = serde_json::to_value(CommonPortsResponse::new()).unwrap();
        let table = json["common_ports"].as_object().unwrap();
        assert_eq!(table.len(), WELL_KNOWN_PORTS.len());
        assert_eq!(table["22"], "SSH");
        assert_eq!(table["25665"], "Minecraft");
    }
}
