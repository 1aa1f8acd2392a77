//! NetProbe Common - Shared utilities: logging and configuration
//!
//! This crate provides common functionality used by the NetProbe binaries.

pub mod config;
pub mod logging;

pub use config::{Config, ConfigBuilder};
pub use logging::init_logging;
