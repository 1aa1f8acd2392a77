//! Error types for NetProbe

use thiserror::Error;

/// Result type alias using NetProbe Error
pub type Result<T> = std::result::Result<T, Error>;

/// Which kind of port token failed to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A single port token, e.g. `abc`
    Port,
    /// A `start-end` range token, e.g. `10-x` or `30-20`
    Range,
}

impl ParseErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ParseErrorKind::Port => "port",
            ParseErrorKind::Range => "port range",
        }
    }
}

/// NetProbe error types
#[derive(Error, Debug)]
pub enum Error {
    // === Request Errors ===
    #[error("{0}")]
    Validation(String),

    #[error("Invalid {}: {}", .kind.label(), .token)]
    Parse { token: String, kind: ParseErrorKind },

    #[error("Too many ports requested. Maximum is {max}")]
    TooManyPorts { requested: usize, max: usize },

    // === Network Errors ===
    #[error("DNS resolution failed for: {hostname}")]
    DnsResolutionFailed { hostname: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Configuration(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Shorthand for an unparseable single-port token
    pub fn invalid_port(token: impl Into<String>) -> Self {
        Error::Parse {
            token: token.into(),
            kind: ParseErrorKind::Port,
        }
    }

    /// Shorthand for an unparseable range token
    pub fn invalid_range(token: impl Into<String>) -> Self {
        Error::Parse {
            token: token.into(),
            kind: ParseErrorKind::Range,
        }
    }

    /// Whether the caller sent something we refuse, as opposed to us failing.
    ///
    /// Client errors are detected before any network activity and their
    /// message is safe to echo back.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::Parse { .. } | Error::TooManyPorts { .. }
        )
    }

    /// Get an error code for logging
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Parse { .. } => "PARSE_ERROR",
            Error::TooManyPorts { .. } => "TOO_MANY_PORTS",
            Error::DnsResolutionFailed { .. } => "DNS_FAILED",
            Error::Configuration(_) => "CONFIG_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
