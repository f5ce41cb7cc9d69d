//! Response record written to the result sink

use serde::{Deserialize, Serialize};

/// Sentinel status code recorded when the transport never produced a status
/// (connection failure, timeout, DNS failure).
pub const STATUS_TRANSPORT_FAILURE: i32 = -1;

/// Outcome of one request's final attempt
///
/// Produced exactly once per dispatched request and appended to the result
/// sink as `<status>\t<json>\n`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Request identifier (explicit id, or the URL host)
    pub id: String,

    /// Target URL
    pub url: String,

    /// HTTP status code, or -1 on transport failure
    #[serde(rename = "status")]
    pub status_code: i32,

    /// Error text of the last failed attempt; empty on success
    pub error: String,

    /// Response body; empty on transport failure
    pub body: String,

    /// Elapsed time across all attempts, in milliseconds
    pub cost_ms: u64,

    /// Line number of the originating input line
    pub line_no: u64,
}

impl Response {
    /// Whether the final attempt completed without a transport error
    pub fn is_success(&self) -> bool {
        self.status_code != STATUS_TRANSPORT_FAILURE
    }
}
