//! HTTP transport seam
//!
//! Workers talk to the network through the [`Transport`] trait so that the
//! retry and accounting logic can be exercised against stub transports.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::request::Request;

/// Outcome of one completed HTTP exchange
///
/// Any status code counts: 4xx/5xx are completed exchanges, not transport
/// failures.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// HTTP status code
    pub status: u16,

    /// Full response body
    pub body: String,
}

/// Transport-level failure (connection, DNS, timeout, body read)
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    /// Human-readable failure description
    pub message: String,
}

impl TransportError {
    /// Create a transport error from any displayable cause
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// One request/response exchange against a remote endpoint
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the exchange; an `Err` is retryable, an `Ok` is final
    /// whatever its status code.
    async fn exchange(&self, request: &Request) -> Result<Exchange, TransportError>;
}

/// Real transport backed by `reqwest`
///
/// The client is built lazily on first use and memoized; its timeout covers
/// the whole attempt (connect + write + read), not sub-phases.
pub struct HttpTransport {
    timeout: Duration,
    client: OnceCell<reqwest::Client>,
}

impl HttpTransport {
    /// Create a transport with the given end-to-end attempt timeout
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&reqwest::Client, TransportError> {
        self.client
            .get_or_try_init(|| async {
                reqwest::Client::builder()
                    .timeout(self.timeout)
                    .build()
                    .map_err(TransportError::from)
            })
            .await
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn exchange(&self, request: &Request) -> Result<Exchange, TransportError> {
        let client = self.client().await?;

        let mut builder = client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        // A failed body read is a transport failure too: the exchange did
        // not complete.
        let body = response.text().await?;

        Ok(Exchange { status, body })
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("timeout", &self.timeout)
            .field("client_built", &self.client.initialized())
            .finish()
    }
}
