//! Dispatcher: bounded-concurrency assignment of requests to idle workers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::input::StreamSource;
use crate::metrics::{aggregate_snapshots, QpsSnapshot};
use crate::request::Request;
use crate::sink::ResultSink;
use crate::transport::Transport;
use crate::worker::{Worker, WorkerCounters};

use super::reporter::{spawn_pool_reporter, spawn_worker_reporter};

/// Per-worker report cadence
const WORKER_REPORT_INTERVAL: Duration = Duration::from_secs(10);

/// Pool-wide report cadence
const POOL_REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Final accounting for a completed run
#[derive(Debug, Clone, Copy)]
pub struct PoolSummary {
    /// Pool-wide counter aggregate (qps is the per-worker sum)
    pub snapshot: QpsSnapshot,

    /// Requests dispatched but not completed; 0 after a clean drain
    pub outstanding: usize,

    /// Wall time from pool construction to shutdown
    pub elapsed: Duration,
}

/// Fixed-size worker pool
///
/// Owns N reusable workers circulating through an idle-token channel of
/// capacity N: a worker is either in the channel (idle) or out executing a
/// request (busy). Acquiring a worker before spawning the execution task is
/// what bounds concurrency, independent of how fast the producer enqueues.
pub struct WorkerPool {
    config: Config,
    transport: Arc<dyn Transport>,
    sink: Arc<ResultSink>,
    counters: Vec<Arc<WorkerCounters>>,
    idle_tx: mpsc::Sender<Worker>,
    idle_rx: mpsc::Receiver<Worker>,
    outstanding: Arc<AtomicUsize>,
    started: Instant,
    reporters: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Create a pool; workers are allocated by [`WorkerPool::run`]
    pub fn new(config: Config, transport: Arc<dyn Transport>, sink: Arc<ResultSink>) -> Self {
        let (idle_tx, idle_rx) = mpsc::channel(config.concurrency);

        Self {
            config,
            transport,
            sink,
            counters: Vec::new(),
            idle_tx,
            idle_rx,
            outstanding: Arc::new(AtomicUsize::new(0)),
            started: Instant::now(),
            reporters: Vec::new(),
        }
    }

    /// Run the pool to completion: dispatch every request the source
    /// produces, drain, and shut the workers down
    ///
    /// Returns `Err` on a sink write failure, which is unrecoverable: the
    /// accounting contract is one durable Response per dispatched request.
    pub async fn run(mut self, mut source: StreamSource) -> Result<PoolSummary> {
        self.prepare()?;

        let (fatal_tx, mut fatal_rx) = mpsc::channel::<Error>(1);

        // Producer -> bounded request queue. The source stalls once the
        // queue is full rather than buffering unboundedly.
        let (request_tx, mut request_rx) = mpsc::channel(self.config.request_queue_size);
        tokio::spawn(async move {
            while let Some(request) = source.next().await {
                if request_tx.send(request).await.is_err() {
                    break;
                }
            }
        });

        tracing::info!(
            concurrency = self.config.concurrency,
            retry = self.config.retry,
            queue = self.config.request_queue_size,
            "worker pool running"
        );

        // Running: block only on the request queue and on worker
        // availability, never on request execution.
        loop {
            tokio::select! {
                biased;

                Some(err) = fatal_rx.recv() => {
                    self.stop_reporters();
                    return Err(err);
                }

                maybe_request = request_rx.recv() => match maybe_request {
                    Some(request) => self.assign(request, &fatal_tx).await?,
                    None => break,
                },
            }
        }

        // Draining: every worker must come home; the last one back
        // observes outstanding == 0.
        tracing::info!("input exhausted, draining");
        let n = self.config.concurrency;
        let mut workers = Vec::with_capacity(n);
        let mut fatal = None;
        while workers.len() < n {
            tokio::select! {
                biased;

                Some(err) = fatal_rx.recv() => {
                    fatal = Some(err);
                    break;
                }

                Some(worker) = self.idle_rx.recv() => workers.push(worker),
            }
        }
        if let Some(err) = fatal {
            self.stop_reporters();
            return Err(err);
        }

        // Stopped
        for worker in workers {
            worker.close();
        }
        self.stop_reporters();

        let snapshots: Vec<QpsSnapshot> = self.counters.iter().map(|c| c.snapshot()).collect();
        let summary = PoolSummary {
            snapshot: aggregate_snapshots(&snapshots),
            outstanding: self.outstanding.load(Ordering::SeqCst),
            elapsed: self.started.elapsed(),
        };

        tracing::info!(
            all_cost = ?summary.elapsed,
            snapshot = %summary.snapshot,
            "all finished"
        );

        Ok(summary)
    }

    /// Prepared: allocate the N workers, seed the idle channel with all of
    /// them, start the reporters
    fn prepare(&mut self) -> Result<()> {
        for id in 0..self.config.concurrency {
            let counters = Arc::new(WorkerCounters::new(id));
            self.counters.push(Arc::clone(&counters));

            let worker = Worker::new(
                id,
                Arc::clone(&self.transport),
                Arc::clone(&self.sink),
                Arc::clone(&counters),
                self.config.retry,
                self.config.trace,
            );
            self.idle_tx
                .try_send(worker)
                .map_err(|_| Error::Worker("failed to seed idle worker pool".into()))?;

            self.reporters
                .push(spawn_worker_reporter(counters, WORKER_REPORT_INTERVAL));
        }

        self.reporters.push(spawn_pool_reporter(
            self.counters.clone(),
            POOL_REPORT_INTERVAL,
        ));

        Ok(())
    }

    /// Acquire an idle worker and fire the request at it
    ///
    /// The spawned continuation decrements the outstanding counter before
    /// returning the worker token, so a reclaimed full set of workers
    /// implies zero outstanding requests.
    async fn assign(&mut self, request: Request, fatal_tx: &mpsc::Sender<Error>) -> Result<()> {
        let worker = self
            .idle_rx
            .recv()
            .await
            .ok_or_else(|| Error::Worker("idle worker channel closed".into()))?;

        self.outstanding.fetch_add(1, Ordering::SeqCst);

        let idle_tx = self.idle_tx.clone();
        let outstanding = Arc::clone(&self.outstanding);
        let fatal_tx = fatal_tx.clone();

        tokio::spawn(async move {
            if let Err(err) = worker.execute(request).await {
                tracing::error!(worker_id = worker.id(), error = %err, "response not recorded");
                let _ = fatal_tx.try_send(err);
            }

            outstanding.fetch_sub(1, Ordering::SeqCst);
            // Send fails only when the pool is already tearing down.
            let _ = idle_tx.send(worker).await;
        });

        Ok(())
    }

    fn stop_reporters(&mut self) {
        for reporter in self.reporters.drain(..) {
            reporter.abort();
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("concurrency", &self.config.concurrency)
            .field("outstanding", &self.outstanding.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
