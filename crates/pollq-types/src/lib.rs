//! PollQ Types - Shared domain types for the long-polling broker
//!
//! This crate contains the types exchanged between the matching engine
//! and the HTTP server.

pub mod error;
pub mod message;
pub mod queue;

// Re-export commonly used types
pub use error::{Error, Result};
pub use message::{parse_payload, ConsumeOutcome, Message, Payload};
pub use queue::{parse_timeout, validate_queue_name, QueueStats, QueueSummary};
