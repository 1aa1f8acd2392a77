//! NetProbe - HTTP port scan service
//!
//! This is the main entry point for the `netprobe` binary.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use netprobe_api::{ApiState, RateLimiter, ScanRequest};
use netprobe_common::logging::{init_logging_with_config, LogConfig};
use netprobe_common::Config;
use netprobe_network::PortScanner;
use tracing::info;

/// NetProbe TCP port scan service
#[derive(Parser, Debug)]
#[command(name = "netprobe")]
#[command(version)]
#[command(about = "Concurrent TCP connect port scanner with a JSON API", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "netprobe.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides config
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (pretty, json, compact); overrides config
    #[arg(long)]
    log_format: Option<String>,

    /// Listen address (overrides config)
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Run a single scan, print the report and exit
    #[arg(long, requires = "target")]
    one_shot: bool,

    /// Target for one-shot scan
    #[arg(long)]
    target: Option<String>,

    /// Port specification for one-shot scan, e.g. "22,80,8000-8010"
    #[arg(long, conflicts_with = "common")]
    ports: Option<String>,

    /// Scan the well-known port table in one-shot mode
    #[arg(long)]
    common: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = if Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        Config::default()
    };
    let mut config = config.merge_env();

    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &args.log_format {
        config.logging.format = format.clone();
    }
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    config.validate()?;

    init_logging_with_config(LogConfig::from(&config.logging));

    info!("NetProbe starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(
        "Max ports: {}, timeout: {}ms, workers: {}",
        config.scanner.max_ports, config.scanner.timeout_ms, config.scanner.max_workers
    );

    let scanner = PortScanner::with_config(config.scanner.scan_config());

    if args.one_shot {
        let request = ScanRequest {
            host: args.target,
            ports: args.ports,
            scan_all_common: args.common,
        };
        return one_shot(&scanner, &request).await;
    }

    let mut state = ApiState::new(scanner).with_max_body_bytes(config.server.max_body_bytes);
    if config.rate_limit.enabled {
        info!(
            "Rate limit: {} requests per {}s per client",
            config.rate_limit.requests, config.rate_limit.window_seconds
        );
        state = state.with_rate_limiter(RateLimiter::new(
            config.rate_limit.requests,
            Duration::from_secs(config.rate_limit.window_seconds),
        ));
    }

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down...");
        }
    };

    netprobe_api::serve(Arc::new(state), config.server.bind_addr, shutdown).await?;
    Ok(())
}

async fn one_shot(scanner: &PortScanner, request: &ScanRequest) -> Result<()> {
    let plan = request.plan()?;
    info!("Running one-shot scan against: {}", plan.target);

    let report = scanner.scan(&plan.host, &plan.ports).await?;
    let json = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
    println!("{}", json);
    Ok(())
}
