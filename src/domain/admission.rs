//! Ingress admission checks: IP allow-list and per-address rate limiting

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Probability of running the stale-entry sweep on any given check
const SWEEP_PROBABILITY: f64 = 0.01;

/// Addresses idle longer than this are dropped by the sweep
const STALE_AFTER: Duration = Duration::from_secs(600);

/// Source-address allow-list.
///
/// An empty list disables the check entirely.
#[derive(Debug, Clone)]
pub struct IpAllowList {
    allowed: Vec<String>,
}

impl IpAllowList {
    pub fn new(allowed: Vec<String>) -> Self {
        Self { allowed }
    }

    /// Check whether a source address may submit events.
    /// The port is stripped before comparison so socket addresses
    /// can be passed as-is.
    pub fn is_address_allowed(&self, address: &str) -> bool {
        if self.allowed.is_empty() {
            return true;
        }
        let host = strip_port(address);
        self.allowed.iter().any(|a| a == host)
    }
}

/// Strip the port from a socket address, leaving bare IPs untouched.
/// Handles `1.2.3.4:5060`, `[::1]:5060`, and unbracketed IPv6.
fn strip_port(address: &str) -> &str {
    if let Some(rest) = address.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            return &rest[..end];
        }
    }
    if address.matches(':').count() == 1 {
        if let Some((host, _)) = address.rsplit_once(':') {
            return host;
        }
    }
    address
}

/// Sliding-window per-address rate limiter.
///
/// Keeps a list of acceptance timestamps per address; only accepted
/// requests consume window slots. Callers hold the lock, this type is
/// plain mutable state.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: usize,
    entries: HashMap<String, Vec<Instant>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            window,
            max_requests,
            entries: HashMap::new(),
        }
    }

    /// Check and record one request for an address.
    /// Opportunistically sweeps long-idle addresses so one-off callers
    /// cannot grow the table without bound.
    pub fn check(&mut self, address: &str) -> bool {
        let now = Instant::now();
        if rand::random::<f64>() < SWEEP_PROBABILITY {
            self.sweep_stale(now);
        }
        self.check_at(address, now)
    }

    /// Window logic with an injectable clock.
    pub fn check_at(&mut self, address: &str, now: Instant) -> bool {
        let window = self.window;
        let stamps = self.entries.entry(address.to_string()).or_default();
        stamps.retain(|t| now.duration_since(*t) < window);
        if stamps.len() >= self.max_requests {
            return false;
        }
        stamps.push(now);
        true
    }

    /// Drop addresses whose most recent acceptance is older than the
    /// staleness threshold.
    pub fn sweep_stale(&mut self, now: Instant) {
        self.entries
            .retain(|_, stamps| stamps.last().is_some_and(|t| now.duration_since(*t) < STALE_AFTER));
    }

    /// Number of addresses currently tracked
    pub fn tracked_addresses(&self) -> usize {
        self.entries.len()
    }
}
