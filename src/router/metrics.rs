use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::dispatcher::Outcome;

/// Dispatch-level counters.
///
/// All counters use atomic operations, so the metrics sit directly on the
/// shared router and update lock-free from concurrent dispatches.
#[derive(Debug, Default)]
pub struct RouterMetrics {
    dispatch_count: AtomicUsize,
    completed: AtomicUsize,
    unhandled: AtomicUsize,
    failed: AtomicUsize,
    timed_out: AtomicUsize,
    cancelled: AtomicUsize,
    not_found: AtomicUsize,
    total_latency_ns: AtomicU64,
}

impl RouterMetrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_dispatch(&self) {
        self.dispatch_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_outcome(&self, outcome: &Outcome, latency: Duration) {
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        let counter = match outcome {
            Outcome::Completed => &self.completed,
            Outcome::Unhandled => &self.unhandled,
            Outcome::Failed(_) => &self.failed,
            Outcome::TimedOut => &self.timed_out,
            Outcome::Cancelled => &self.cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Total number of dispatched requests.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.dispatch_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn unhandled_count(&self) -> usize {
        self.unhandled.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn timed_out_count(&self) -> usize {
        self.timed_out.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn cancelled_count(&self) -> usize {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Dispatches that fell through to the not-found handler.
    #[must_use]
    pub fn not_found_count(&self) -> usize {
        self.not_found.load(Ordering::Relaxed)
    }

    /// Mean dispatch latency, zero until the first request completes.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.dispatch_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }
}
