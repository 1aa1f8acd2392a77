//! HTTP server for the scan API
//!
//! Routes:
//! - `GET /` serves the bundled front-end
//! - `GET /common-ports` returns the well-known port table
//! - `POST /scan` validates the request, scans, and returns the report
//!
//! Every response body is JSON except the front-end. Internal failures are
//! logged in full and reported to the client as a generic 500.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use netprobe_core::{Error, Result};
use netprobe_network::{PortProber, PortScanner, ScanReport, TcpProber};
use tracing::{debug, error, info, warn};
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::{self, Reply, Response};
use warp::{Filter, Rejection};

use crate::rate_limit::RateLimiter;
use crate::types::{CommonPortsResponse, ErrorResponse, ScanRequest};

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared state behind every route
pub struct ApiState<P = TcpProber> {
    scanner: PortScanner<P>,
    limiter: Option<RateLimiter>,
    max_body_bytes: u64,
}

impl<P: PortProber> ApiState<P> {
    pub fn new(scanner: PortScanner<P>) -> Self {
        Self {
            scanner,
            limiter: None,
            max_body_bytes: 16 * 1024,
        }
    }

    /// Limit `POST /scan` per client address
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn with_max_body_bytes(mut self, max: u64) -> Self {
        self.max_body_bytes = max;
        self
    }

    pub fn scanner(&self) -> &PortScanner<P> {
        &self.scanner
    }
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Bind failed on {addr}: {reason}")]
    BindFailed { addr: SocketAddr, reason: String },
}

/// Decode, validate and run one scan request
pub async fn run_scan<P: PortProber>(scanner: &PortScanner<P>, body: &[u8]) -> Result<ScanReport> {
    let plan = ScanRequest::from_body(body)?.plan()?;
    debug!("Scan requested for {} ({} ports)", plan.target, plan.ports.len());
    scanner.scan(&plan.host, &plan.ports).await
}

/// Build the full route tree
pub fn routes<P: PortProber>(
    state: Arc<ApiState<P>>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let index = warp::path::end()
        .and(warp::get())
        .map(|| reply::html(INDEX_HTML));

    let common_ports = warp::path("common-ports")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| reply::json(&CommonPortsResponse::new()));

    let scan = warp::path("scan")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::addr::remote())
        .and(warp::body::content_length_limit(state.max_body_bytes))
        .and(warp::body::bytes())
        .and(with_state(state))
        .and_then(handle_scan::<P>);

    index
        .or(common_ports)
        .or(scan)
        .recover(handle_rejection)
        .with(warp::log::custom(|info| {
            info!(
                target: "netprobe::access",
                method = %info.method(),
                path = info.path(),
                status = info.status().as_u16(),
                elapsed = ?info.elapsed(),
                "request"
            );
        }))
}

/// Bind to `addr` and serve until `shutdown` resolves
pub async fn serve<P: PortProber>(
    state: Arc<ApiState<P>>,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::result::Result<(), ServerError> {
    let (bound, server) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .map_err(|e| ServerError::BindFailed {
            addr,
            reason: e.to_string(),
        })?;

    info!("Listening on http://{}", bound);
    server.await;
    info!("Server stopped");
    Ok(())
}

fn with_state<P: PortProber>(
    state: Arc<ApiState<P>>,
) -> impl Filter<Extract = (Arc<ApiState<P>>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&state))
}

async fn handle_scan<P: PortProber>(
    remote: Option<SocketAddr>,
    body: Bytes,
    state: Arc<ApiState<P>>,
) -> std::result::Result<Response, Infallible> {
    if let Some(limiter) = &state.limiter {
        let client = remote.map(|addr| addr.ip());
        if let Err(retry_after) = limiter.check(client).await {
            warn!("Rate limit exceeded for {:?}", client);
            let message = format!(
                "Rate limit exceeded: {} per {} second(s)",
                limiter.limit(),
                limiter.window().as_secs()
            );
            let response = reply::with_header(
                json_error(StatusCode::TOO_MANY_REQUESTS, message),
                "retry-after",
                retry_after.as_secs().max(1).to_string(),
            );
            return Ok(response.into_response());
        }
    }

    let response = match run_scan(&state.scanner, &body).await {
        Ok(report) => reply::with_status(reply::json(&report), StatusCode::OK).into_response(),
        Err(e) => error_response(&e),
    };
    Ok(response)
}

/// Map an error to its HTTP response
pub fn error_response(err: &Error) -> Response {
    if err.is_client_error() {
        debug!("Rejected scan request: {}", err);
        json_error(StatusCode::BAD_REQUEST, err.to_string()).into_response()
    } else {
        error!(code = err.code(), "Scan error: {}", err);
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

fn json_error(status: StatusCode, message: impl Into<String>) -> reply::WithStatus<reply::Json> {
    reply::with_status(reply::json(&ErrorResponse::new(message)), status)
}

async fn handle_rejection(err: Rejection) -> std::result::Result<Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found")
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::BAD_REQUEST, "No JSON data provided")
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else {
        error!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };

    Ok(json_error(status, message).into_response())
}
