//! Queue-facing types for PollQ
//!
//! Listing snapshots, per-queue statistics and request parameter parsing.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{Error, Result};

/// One entry of the queue listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueSummary {
    /// Queue name
    pub name: String,

    /// Number of buffered (undelivered) messages
    pub message_count: u64,
}

/// Detailed state of a single queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    /// Queue name
    pub name: String,

    /// Number of buffered (undelivered) messages
    pub message_count: u64,

    /// Number of consumers currently long-polling this queue
    pub waiting_consumers: u64,
}

/// Reject queue names the router could not have produced.
pub fn validate_queue_name(name: &str) -> Result<&str> {
    if name.is_empty() {
        return Err(Error::InvalidQueueName(name.to_string()));
    }
    Ok(name)
}

/// Parse a `timeout` query value in milliseconds.
///
/// Returns `None` for anything that is not a positive integer; callers fall
/// back to their default instead of rejecting the request.
pub fn parse_timeout(raw: Option<&str>) -> Option<Duration> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}
