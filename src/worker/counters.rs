//! Per-worker atomic counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::metrics::QpsSnapshot;

/// Counters owned by one worker
///
/// Mutated only by the owning worker via atomic increments; the reporters
/// read them without further synchronization, so a snapshot is eventually
/// consistent.
#[derive(Debug)]
pub struct WorkerCounters {
    id: usize,
    attempts: AtomicU64,
    successes: AtomicU64,
    started: Instant,
}

impl WorkerCounters {
    /// Create counters for the worker with the given id
    pub fn new(id: usize) -> Self {
        Self {
            id,
            attempts: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Worker id these counters belong to
    pub fn id(&self) -> usize {
        self.id
    }

    /// Count one dispatched request (one per execute, not per retry attempt)
    pub fn record_dispatch(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one request that finished without a final transport error
    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    /// Elapsed time since worker creation
    pub fn elapsed(&self) -> std::time::Duration {
        self.started.elapsed()
    }

    /// Snapshot the counters
    ///
    /// qps is successes over elapsed-since-creation; a fresh worker reports
    /// 0.0 rather than dividing by zero.
    pub fn snapshot(&self) -> QpsSnapshot {
        let success = self.successes.load(Ordering::Relaxed);
        let secs = self.started.elapsed().as_secs_f64();
        let qps = if secs > 0.0 { success as f64 / secs } else { 0.0 };

        QpsSnapshot {
            total: self.attempts.load(Ordering::Relaxed),
            success,
            qps,
        }
    }
}
