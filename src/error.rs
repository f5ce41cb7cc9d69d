//! Error types for http-multi

use thiserror::Error;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Input stream error (unreadable source, unknown format)
    #[error("input error: {0}")]
    Input(String),

    /// Worker / pool coordination error
    #[error("worker error: {0}")]
    Worker(String),

    /// Result sink write error. Fatal: a lost Response means lost accounting.
    #[error("failed to record response: {0}")]
    Sink(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
