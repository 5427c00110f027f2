//! Message types for PollQ
//!
//! A message is an opaque JSON payload plus the time it entered the broker.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::Result;

/// Message content. The broker stores and forwards it verbatim.
pub type Payload = Value;

/// A message held by a queue
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    content: Payload,
    enqueued_at: DateTime<Utc>,
}

impl Message {
    /// Wrap a payload, stamping it with the current time
    pub fn new(content: Payload) -> Self {
        Self {
            content,
            enqueued_at: Utc::now(),
        }
    }

    /// Borrow the payload
    pub fn content(&self) -> &Payload {
        &self.content
    }

    /// When the message was produced. Never sent to consumers.
    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }

    /// Consume the message, keeping only the payload
    pub fn into_content(self) -> Payload {
        self.content
    }
}

/// Result of a consume request. Both variants are normal outcomes.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumeOutcome {
    /// A message was available or arrived before the deadline
    Delivered(Payload),
    /// The deadline passed with no message
    TimedOut,
}

impl ConsumeOutcome {
    /// The delivered payload, if any
    pub fn into_payload(self) -> Option<Payload> {
        match self {
            Self::Delivered(payload) => Some(payload),
            Self::TimedOut => None,
        }
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

/// Parse a raw request body into a payload.
///
/// A blank body is treated as an empty JSON object, so a bare `POST` still
/// produces a message.
pub fn parse_payload(body: &[u8]) -> Result<Payload> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    Ok(serde_json::from_slice(body)?)
}
