//! Fixed-window request limiting per client address

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

/// Buckets kept before expired windows are swept, at most once per window
const SWEEP_THRESHOLD: usize = 4096;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug, Default)]
struct Buckets {
    windows: HashMap<Option<IpAddr>, Window>,
    last_sweep: Option<Instant>,
}

/// Allows `limit` requests per client per `window`.
///
/// Requests with no known remote address share a single bucket.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    buckets: Mutex<Buckets>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            buckets: Mutex::new(Buckets::default()),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a request from `client`.
    ///
    /// Returns `Err` with the time left in the current window once the
    /// client has used up its quota.
    pub async fn check(&self, client: Option<IpAddr>) -> Result<(), Duration> {
        self.check_at(client, Instant::now()).await
    }

    async fn check_at(&self, client: Option<IpAddr>, now: Instant) -> Result<(), Duration> {
        let mut buckets = self.buckets.lock().await;
        let window = self.window;

        let sweep_due = buckets
            .last_sweep
            .map_or(true, |last| now.duration_since(last) >= window);
        if buckets.windows.len() >= SWEEP_THRESHOLD && sweep_due {
            buckets
                .windows
                .retain(|_, w| now.duration_since(w.started) < window);
            buckets.last_sweep = Some(now);
            debug!("Swept rate limit buckets, {} remain", buckets.windows.len());
        }

        let bucket = buckets.windows.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.duration_since(bucket.started);
        if elapsed >= window {
            bucket.started = now;
            bucket.count = 0;
        }

        if bucket.count >= self.limit {
            return Err(window.saturating_sub(now.duration_since(bucket.started)));
        }

        bucket.count += 1;
        Ok(())
    }
}
