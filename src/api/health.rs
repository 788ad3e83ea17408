//! Shared health state for the /health endpoint.
//! Updated by the dashboard handlers at the request boundary.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Request counters. Handlers record, /health reads.
#[derive(Default)]
pub struct HealthState {
    pub requests_served: AtomicU64,
    pub requests_failed: AtomicU64,
    /// Millisecond timestamp of the last successful dashboard response (0 = none).
    pub last_success_at_ms: AtomicI64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, at_ms: i64) {
        self.requests_served.fetch_add(1, Ordering::Relaxed);
        self.last_success_at_ms.store(at_ms, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.requests_served.fetch_add(1, Ordering::Relaxed);
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests_served(&self) -> u64 {
        self.requests_served.load(Ordering::Relaxed)
    }

    pub fn requests_failed(&self) -> u64 {
        self.requests_failed.load(Ordering::Relaxed)
    }

    /// None until the first successful response.
    pub fn last_success_at_ms(&self) -> Option<i64> {
        match self.last_success_at_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Some(ms),
        }
    }
}
