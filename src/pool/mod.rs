//! Worker pool: dispatch, concurrency coordination, and shutdown
//!
//! The pool owns a fixed set of N workers and moves through
//! **Created -> Prepared -> Running -> Draining -> Stopped**:
//!
//! 1. Prepared: allocate the workers, seed the idle-token channel, start
//!    the source's read loop and the reporters.
//! 2. Running: pull a request from the bounded queue, pull an idle worker,
//!    bump the outstanding counter, spawn the execution -- the loop never
//!    waits for a request to finish, only for work and for a free worker.
//! 3. Draining: the queue closed; reclaim all N workers, which can only
//!    happen once every in-flight request has completed and reported.
//! 4. Stopped: close each worker (logging its final counters) and emit the
//!    run summary.
//!
//! Completion order is unordered by design; only assignment order is FIFO.

mod dispatcher;
mod reporter;

pub use dispatcher::{PoolSummary, WorkerPool};
