//! Throughput snapshots and pool-wide aggregation

/// Point-in-time view of one worker's counters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QpsSnapshot {
    /// Requests dispatched to the worker (one per execute, not per attempt)
    pub total: u64,

    /// Requests that completed without a final transport error
    pub success: u64,

    /// Successes per second, elapsed measured from worker creation
    pub qps: f64,
}

impl std::fmt::Display for QpsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "total={} success={} qps={:.2}",
            self.total, self.success, self.qps
        )
    }
}

/// Sum per-worker snapshots into a pool-wide figure
///
/// The pool qps is the *sum* of per-worker rates, not a combined rate over
/// combined totals. This over-counts when workers have uneven start times;
/// it is kept that way deliberately, matching the reported log lines this
/// tool has always produced.
pub fn aggregate_snapshots(snapshots: &[QpsSnapshot]) -> QpsSnapshot {
    let mut pool = QpsSnapshot::default();
    for snapshot in snapshots {
        pool.total += snapshot.total;
        pool.success += snapshot.success;
        pool.qps += snapshot.qps;
    }
    pool
}
