//! Worker: executes one request end-to-end, retries included

use std::sync::Arc;
use std::time::Instant;

use crate::error::Result;
use crate::request::Request;
use crate::response::{Response, STATUS_TRANSPORT_FAILURE};
use crate::sink::ResultSink;
use crate::transport::{Exchange, Transport, TransportError};

use super::counters::WorkerCounters;

/// A reusable execution unit
///
/// Owns its counters; the transport and sink are shared across the pool.
/// A worker handles one request at a time -- the pool's free-worker token
/// channel guarantees it is never assigned two requests concurrently.
pub struct Worker {
    id: usize,
    transport: Arc<dyn Transport>,
    sink: Arc<ResultSink>,
    counters: Arc<WorkerCounters>,
    retry: u32,
    trace: bool,
}

impl Worker {
    /// Create a worker
    pub fn new(
        id: usize,
        transport: Arc<dyn Transport>,
        sink: Arc<ResultSink>,
        counters: Arc<WorkerCounters>,
        retry: u32,
        trace: bool,
    ) -> Self {
        tracing::info!(worker_id = id, "worker started");
        Self {
            id,
            transport,
            sink,
            counters,
            retry,
            trace,
        }
    }

    /// Worker id
    pub fn id(&self) -> usize {
        self.id
    }

    /// Execute one request: retry transport failures, record exactly one
    /// Response in the sink
    ///
    /// Transport failures are contained here and recorded as a Response
    /// with status -1. The only error that escapes is a sink write
    /// failure, which the pool treats as fatal.
    pub async fn execute(&self, request: Request) -> Result<()> {
        self.counters.record_dispatch();

        if self.trace {
            tracing::info!(
                worker_id = self.id,
                method = %request.method,
                url = %request.url,
                headers = ?request.headers,
                body = request.body.as_deref().unwrap_or(""),
                "dump http request"
            );
        }

        let attempts = 1 + self.retry;
        let mut outcome: std::result::Result<Exchange, TransportError> =
            Err(TransportError::new("no attempt made"));
        let start = Instant::now();

        for attempt in 0..attempts {
            outcome = self.transport.exchange(&request).await;
            match &outcome {
                Ok(exchange) => {
                    if self.trace {
                        tracing::info!(
                            worker_id = self.id,
                            status = exchange.status,
                            body = %exchange.body,
                            "dump http response"
                        );
                    }
                    break;
                }
                Err(e) => {
                    tracing::debug!(
                        worker_id = self.id,
                        line_no = request.line_no,
                        attempt = attempt + 1,
                        error = %e,
                        "attempt failed"
                    );
                }
            }
        }

        let cost_ms = start.elapsed().as_millis() as u64;

        let response = match outcome {
            Ok(exchange) => {
                self.counters.record_success();
                Response {
                    id: request.id,
                    url: request.url.to_string(),
                    status_code: i32::from(exchange.status),
                    error: String::new(),
                    body: exchange.body,
                    cost_ms,
                    line_no: request.line_no,
                }
            }
            Err(e) => Response {
                id: request.id,
                url: request.url.to_string(),
                status_code: STATUS_TRANSPORT_FAILURE,
                error: e.to_string(),
                body: String::new(),
                cost_ms,
                line_no: request.line_no,
            },
        };

        // The HTTP outcome is already captured in `response`; a failure
        // from here on is a sink failure, a separate category.
        self.sink.append(&response)?;

        Ok(())
    }

    /// Log the final counter snapshot and consume the worker
    pub fn close(self) {
        let snapshot = self.counters.snapshot();
        tracing::info!(
            worker_id = self.id,
            worker_cost = ?self.counters.elapsed(),
            %snapshot,
            "worker stopped"
        );
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("retry", &self.retry)
            .field("trace", &self.trace)
            .finish_non_exhaustive()
    }
}
