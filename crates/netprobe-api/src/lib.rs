//! NetProbe API - HTTP surface for the scan engine
//!
//! This crate provides:
//! - The warp route tree and server entry point
//! - Request/response types for the JSON API
//! - Per-client rate limiting for the scan endpoint

pub mod rate_limit;
pub mod server;
pub mod types;

pub use rate_limit::RateLimiter;
pub use server::{routes, run_scan, serve, ApiState, ServerError};
pub use types::{CommonPortsResponse, ErrorResponse, ScanPlan, ScanRequest};
