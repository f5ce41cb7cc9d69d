//! Worker module: the per-request execution and retry state machine
//!
//! A Worker owns one memoized HTTP client (behind the transport) and
//! performs one exchange at a time: **receive -> attempt (with retry) ->
//! record -> become idle**. Retries cover transport failures only; any
//! HTTP status code, 4xx/5xx included, is a completed exchange. Exactly
//! one Response reaches the sink per dispatched request.

mod counters;
mod executor;

pub use counters::WorkerCounters;
pub use executor::Worker;
