//! Broker - produce, consume and listing entry points
//!
//! The Broker owns the queue registry and is shared by every request handler.

use std::time::Duration;

use pollq_types::{ConsumeOutcome, Message, Payload, QueueStats, QueueSummary};
use tracing::{debug, info};

use crate::config::BrokerConfig;
use crate::queue::{Claim, Dispatch};
use crate::registry::QueueRegistry;

/// Long-polling message broker
pub struct Broker {
    registry: QueueRegistry,
    config: BrokerConfig,
}

impl Broker {
    /// Create a broker with an empty registry
    pub fn new(config: BrokerConfig) -> Self {
        info!(
            default_timeout_ms = config.default_timeout.as_millis() as u64,
            max_timeout_ms = ?config.max_timeout.map(|t| t.as_millis() as u64),
            "Initializing PollQ broker"
        );
        Self {
            registry: QueueRegistry::new(),
            config,
        }
    }

    /// Publish a payload to a queue, creating the queue if needed.
    ///
    /// Never blocks and never fails.
    pub fn produce(&self, queue_name: &str, payload: Payload) -> Dispatch {
        let queue = self.registry.get_or_create(queue_name);
        let dispatch = queue.offer(Message::new(payload));

        match dispatch {
            Dispatch::HandedOff(waiter_id) => {
                debug!(queue = %queue_name, waiter_id = %waiter_id, "Message handed off")
            }
            Dispatch::Buffered(depth) => {
                debug!(queue = %queue_name, depth = depth, "Message buffered")
            }
        }
        dispatch
    }

    /// Take the next message from a queue, waiting up to `timeout` for one.
    ///
    /// `None` or a zero timeout means the configured default.
    pub async fn consume(&self, queue_name: &str, timeout: Option<Duration>) -> ConsumeOutcome {
        let timeout = self.config.effective_timeout(timeout);
        let queue = self.registry.get_or_create(queue_name);

        let message = match queue.claim() {
            Claim::Ready(message) => Some(message),
            Claim::Waiting(handle) => {
                debug!(
                    queue = %queue_name,
                    waiter_id = %handle.id(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Waiting for message"
                );
                handle.wait(timeout).await
            }
        };

        match message {
            Some(message) => ConsumeOutcome::Delivered(message.into_content()),
            None => ConsumeOutcome::TimedOut,
        }
    }

    /// Names and buffered-message counts of every known queue
    pub fn list_queues(&self) -> Vec<QueueSummary> {
        self.registry.list()
    }

    /// Buffered and waiting counts for one queue; does not create it
    pub fn queue_stats(&self, queue_name: &str) -> Option<QueueStats> {
        self.registry.get(queue_name).map(|queue| QueueStats {
            name: queue.name().to_string(),
            message_count: queue.len() as u64,
            waiting_consumers: queue.waiting() as u64,
        })
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new(BrokerConfig::default())
    }
}
