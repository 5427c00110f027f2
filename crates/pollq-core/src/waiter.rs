//! Suspended long-poll consumers
//!
//! A consume request that finds its queue empty is split in two halves. The
//! [`Waiter`] sits in the queue's waiter list and owns the one-shot sender;
//! the [`WaitHandle`] stays with the request and owns the receiver. Whoever
//! removes the `Waiter` from the list under the queue lock decides how the
//! request resolves: a producer delivers into it, or the handle cancels it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use pollq_types::Message;
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

use crate::queue::Queue;

/// Identity of a waiting consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaiterId(Uuid);

impl WaiterId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for WaiterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Queue-side half of a suspended consumer
pub(crate) struct Waiter {
    id: WaiterId,
    sender: oneshot::Sender<Message>,
}

impl Waiter {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<Message>) {
        let (sender, receiver) = oneshot::channel();
        let waiter = Self {
            id: WaiterId::new(),
            sender,
        };
        (waiter, receiver)
    }

    pub(crate) fn id(&self) -> WaiterId {
        self.id
    }

    /// Resolve the waiter. Consumes it, so it can fire at most once.
    ///
    /// Gives the message back if the consumer side is already gone.
    pub(crate) fn deliver(self, message: Message) -> Result<WaiterId, Message> {
        let id = self.id;
        self.sender.send(message).map(|()| id)
    }
}

/// Request-side half of a suspended consumer
///
/// Dropping an unresolved handle (for example when the HTTP client
/// disconnects) removes its waiter from the queue. A message that was handed
/// to it but never received is returned to the queue.
pub struct WaitHandle {
    id: WaiterId,
    queue: Arc<Queue>,
    receiver: oneshot::Receiver<Message>,
    resolved: bool,
}

impl WaitHandle {
    pub(crate) fn new(
        id: WaiterId,
        queue: Arc<Queue>,
        receiver: oneshot::Receiver<Message>,
    ) -> Self {
        Self {
            id,
            queue,
            receiver,
            resolved: false,
        }
    }

    pub fn id(&self) -> WaiterId {
        self.id
    }

    /// Wait up to `timeout` for a producer to hand over a message.
    ///
    /// Returns `None` once the deadline passes; the waiter is no longer
    /// registered at that point.
    pub async fn wait(mut self, timeout: Duration) -> Option<Message> {
        let outcome = tokio::time::timeout(timeout, &mut self.receiver).await;
        self.resolved = true;

        match outcome {
            Ok(Ok(message)) => {
                debug!(
                    queue = %self.queue.name(),
                    waiter_id = %self.id,
                    "Message handed to waiting consumer"
                );
                Some(message)
            }
            Ok(Err(_)) => None,
            Err(_) => self.expire(),
        }
    }

    fn expire(&mut self) -> Option<Message> {
        if self.queue.cancel(self.id) {
            debug!(
                queue = %self.queue.name(),
                waiter_id = %self.id,
                "Long poll timed out"
            );
            return None;
        }

        // A producer claimed the waiter right at the deadline; the message is
        // already sitting in the channel.
        self.receiver.try_recv().ok()
    }
}

impl fmt::Debug for WaitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitHandle")
            .field("id", &self.id)
            .field("queue", &self.queue.name())
            .field("resolved", &self.resolved)
            .finish()
    }
}

impl Drop for WaitHandle {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }

        if self.queue.cancel(self.id) {
            debug!(
                queue = %self.queue.name(),
                waiter_id = %self.id,
                "Consumer went away, waiter removed"
            );
            return;
        }

        if let Ok(message) = self.receiver.try_recv() {
            debug!(
                queue = %self.queue.name(),
                waiter_id = %self.id,
                "Consumer went away after handoff, message returned to queue"
            );
            self.queue.reclaim(message);
        }
    }
}
