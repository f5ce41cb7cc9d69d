//! Runtime configuration

use std::time::Duration;

/// Input format: one URL per line, sent as a GET request.
pub const INPUT_FORMAT_URL_LIST_GET: &str = "url_list_get";

/// Input format: one JSON object per line (`{id, method, url, header, body}`).
pub const INPUT_FORMAT_JSON: &str = "json";

/// Sentinel for `--input` selecting standard input.
pub const INPUT_STDIN: &str = "stdin";

/// Log file name that disables file logging entirely.
pub const LOG_DISABLED: &str = "no";

/// Process configuration
///
/// Supplied once at startup and immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input source: `stdin` or a file path
    pub input: String,

    /// Input line format (`url_list_get` or `json`)
    pub input_format: String,

    /// Number of concurrent workers
    pub concurrency: usize,

    /// Retry count for transport failures (attempts = 1 + retry)
    pub retry: u32,

    /// End-to-end request timeout in milliseconds
    pub timeout_ms: u64,

    /// Capacity of the pending-request queue
    pub request_queue_size: usize,

    /// Dump full requests/responses to the log
    pub trace: bool,

    /// Log file path, or `no` to log to stderr only
    pub log_file: String,

    /// Response output file path
    pub out_file: String,
}

impl Default for Config {
    fn default() -> Self {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        Self {
            input: INPUT_STDIN.to_string(),
            input_format: INPUT_FORMAT_URL_LIST_GET.to_string(),
            concurrency: 1,
            retry: 3,
            timeout_ms: 3000,
            request_queue_size: 1024,
            trace: false,
            log_file: format!("./log/http.log.{stamp}"),
            out_file: format!("./data/resp_{stamp}"),
        }
    }
}

impl Config {
    /// Whether requests are read from standard input
    pub fn is_stdin(&self) -> bool {
        self.input == INPUT_STDIN
    }

    /// Whether file logging is enabled
    pub fn log_enabled(&self) -> bool {
        self.log_file != LOG_DISABLED
    }

    /// End-to-end per-attempt timeout (connect + write + read combined)
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(
                "concurrency must be at least 1".into(),
            ));
        }

        if self.request_queue_size == 0 {
            return Err(ConfigError::InvalidQueueSize(
                "request queue size must be at least 1".into(),
            ));
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "timeout must be positive".into(),
            ));
        }

        if self.input.is_empty() {
            return Err(ConfigError::MissingPath("input is required".into()));
        }

        if self.log_file.is_empty() {
            return Err(ConfigError::MissingPath("log file name is required".into()));
        }

        if self.out_file.is_empty() {
            return Err(ConfigError::MissingPath(
                "output file name is required".into(),
            ));
        }

        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid concurrency value
    #[error("Invalid concurrency: {0}")]
    InvalidConcurrency(String),

    /// Invalid queue size
    #[error("Invalid queue size: {0}")]
    InvalidQueueSize(String),

    /// Invalid timeout
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    /// Missing required path
    #[error("Missing path: {0}")]
    MissingPath(String),
}
