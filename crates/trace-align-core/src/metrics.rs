//! Global atomic counters for alignment runs.
//!
//! Counters are incremented silently at the call site. Event counters only
//! cover traces that made it into the output. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event at the end of a run.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    traces_aligned: AtomicU64,
    traces_skipped: AtomicU64,
    events_synthesized: AtomicU64,
    events_deleted: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            traces_aligned: AtomicU64::new(0),
            traces_skipped: AtomicU64::new(0),
            events_synthesized: AtomicU64::new(0),
            events_deleted: AtomicU64::new(0),
        }
    }

    pub fn inc_traces_aligned(&self) {
        self.traces_aligned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_traces_skipped(&self) {
        self.traces_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Model-only moves replayed in an accepted trace.
    pub fn add_events_synthesized(&self, n: u64) {
        self.events_synthesized.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "events_synthesized", n, "counter incremented");
    }

    /// Log-only moves replayed in an accepted trace.
    pub fn add_events_deleted(&self, n: u64) {
        self.events_deleted.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "events_deleted", n, "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            traces_aligned = self.traces_aligned(),
            traces_skipped = self.traces_skipped(),
            events_synthesized = self.events_synthesized(),
            events_deleted = self.events_deleted(),
        );
    }

    pub fn traces_aligned(&self) -> u64 {
        self.traces_aligned.load(Ordering::Relaxed)
    }

    pub fn traces_skipped(&self) -> u64 {
        self.traces_skipped.load(Ordering::Relaxed)
    }

    pub fn events_synthesized(&self) -> u64 {
        self.events_synthesized.load(Ordering::Relaxed)
    }

    pub fn events_deleted(&self) -> u64 {
        self.events_deleted.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.traces_aligned.store(0, Ordering::Relaxed);
        self.traces_skipped.store(0, Ordering::Relaxed);
        self.events_synthesized.store(0, Ordering::Relaxed);
        self.events_deleted.store(0, Ordering::Relaxed);
    }
}
