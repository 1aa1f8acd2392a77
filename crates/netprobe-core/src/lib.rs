//! NetProbe Core - Foundation types and error handling
//!
//! This crate provides the abstractions shared by every NetProbe crate:
//! - `Error` / `Result`: the request-level error taxonomy
//! - `validate_host` / `ScanTarget`: syntactic validation of scan targets

pub mod error;
pub mod target;

pub use error::{Error, ParseErrorKind, Result};
pub use target::{validate_host, ScanTarget};
