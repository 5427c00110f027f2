//! Error types for PollQ
//!
//! The matching engine itself never fails; these errors come from the
//! request boundary and from startup configuration.

use thiserror::Error;

/// Main error type for PollQ operations
#[derive(Error, Debug)]
pub enum Error {
    /// Queue name rejected at the request boundary
    #[error("Invalid queue name: {0:?}")]
    InvalidQueueName(String),

    /// Queue has never been referenced
    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    /// Request body is not valid JSON
    #[error("Invalid payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid startup configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for PollQ operations
pub type Result<T> = std::result::Result<T, Error>;
