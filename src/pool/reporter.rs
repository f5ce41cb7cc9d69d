//! Periodic QPS reporters
//!
//! Reporting reads counter snapshots only; it never blocks or perturbs
//! dispatch.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::metrics::aggregate_snapshots;
use crate::worker::WorkerCounters;

/// Log one worker's throughput on a fixed cadence
pub(crate) fn spawn_worker_reporter(
    counters: Arc<WorkerCounters>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(period);
        tick.tick().await; // the first tick fires immediately, skip it

        loop {
            tick.tick().await;
            let snapshot = counters.snapshot();
            tracing::info!(worker_id = counters.id(), %snapshot, "worker_qps_info");
        }
    })
}

/// Log the pool-wide additive aggregate on a fixed cadence
pub(crate) fn spawn_pool_reporter(
    counters: Vec<Arc<WorkerCounters>>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(period);
        tick.tick().await;

        loop {
            tick.tick().await;
            let snapshots: Vec<_> = counters.iter().map(|c| c.snapshot()).collect();
            let pool = aggregate_snapshots(&snapshots);
            tracing::info!(snapshot = %pool, "pool_qps_info");
        }
    })
}
