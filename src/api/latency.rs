//! Slate assembly timings for `/stats/latency`.
//!
//! Only the in-process aggregation step is measured: from the moment the
//! reader's rows are in hand until the `Slate` is built. Database time is
//! not included.

use std::sync::Mutex;
use std::time::Duration;

use hdrhistogram::Histogram;

/// Largest recordable sample, in microseconds (100 s).
const MAX_TRACKED_US: u64 = 100_000_000;

/// Percentile view of the recorded assembly times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySnapshot {
    pub samples: u64,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
}

/// One sample per assembled slate, shared by both dashboard handlers.
pub struct LatencyStats {
    slate_us: Mutex<Histogram<u64>>,
}

impl LatencyStats {
    pub fn new() -> Self {
        // 1 us .. 100 s at 3 significant figures; these bounds are always valid.
        let histogram = Histogram::new_with_bounds(1, MAX_TRACKED_US, 3)
            .expect("valid histogram bounds");
        Self {
            slate_us: Mutex::new(histogram),
        }
    }

    /// Sub-microsecond assemblies (an empty slate) count as 1 us. Samples past
    /// the upper bound are clamped to it.
    pub fn record_slate(&self, elapsed: Duration) {
        let us = u64::try_from(elapsed.as_micros()).unwrap_or(MAX_TRACKED_US);
        if let Ok(mut h) = self.slate_us.lock() {
            let _ = h.record(us.clamp(1, MAX_TRACKED_US));
        }
    }

    pub fn snapshot(&self) -> LatencySnapshot {
        let Ok(h) = self.slate_us.lock() else {
            return LatencySnapshot { samples: 0, p50_ms: None, p95_ms: None, p99_ms: None };
        };
        let at = |q: f64| (h.len() > 0).then(|| h.value_at_quantile(q) as f64 / 1_000.0);
        LatencySnapshot {
            samples: h.len(),
            p50_ms: at(0.50),
            p95_ms: at(0.95),
            p99_ms: at(0.99),
        }
    }
}
