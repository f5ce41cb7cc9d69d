//! http-multi: concurrent batch HTTP request runner
//!
//! Reads request descriptions line by line (bare URLs or JSON records),
//! dispatches them against a bounded pool of reusable workers, retries
//! transient transport failures, records one Response per request in an
//! append-only sink, and reports per-worker and pool-wide throughput.
//!
//! The moving parts:
//!
//! - [`input::StreamSource`] -- concurrent read loop feeding a bounded
//!   request queue
//! - [`pool::WorkerPool`] -- the dispatch and drain coordinator
//! - [`worker::Worker`] -- per-request execution with retry
//! - [`sink::ResultSink`] -- durable, mutex-guarded outcome log
//! - [`metrics`] -- QPS snapshots and the additive pool aggregate

#![warn(clippy::all)]

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod metrics;
pub mod pool;
pub mod request;
pub mod response;
pub mod sink;
pub mod transport;
pub mod worker;

pub use config::Config;
pub use error::{Error, Result};
pub use input::StreamSource;
pub use metrics::QpsSnapshot;
pub use pool::{PoolSummary, WorkerPool};
pub use request::{ParserRegistry, Request};
pub use response::Response;
pub use sink::ResultSink;
pub use transport::{HttpTransport, Transport};
pub use worker::{Worker, WorkerCounters};
