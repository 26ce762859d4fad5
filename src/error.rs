//! Error types for the screening core

use thiserror::Error;

/// Result type alias for the screening core
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the screening core
#[derive(Debug, Error)]
pub enum Error {
    /// The referenced source artifact does not exist
    #[error("source not found: {0}")]
    SourceNotFound(String),

    /// The source bytes could not be parsed as delimited text
    #[error("parse failure: {0}")]
    ParseFailure(String),

    /// A dataset or record store operation failed
    #[error("storage failure: {0}")]
    Storage(String),

    /// The transport rejected or failed to deliver a message
    #[error("delivery failure: {0}")]
    Delivery(String),

    /// A notification exhausted its retry budget
    #[error("retry budget exhausted after {0} attempts")]
    RetryExhausted(u32),

    /// The queue consumer has gone away
    #[error("{0} queue closed")]
    QueueClosed(&'static str),

    /// Anything else
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::ParseFailure(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(format!("serialization error: {}", e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Internal(format!("io error: {}", e))
    }
}
