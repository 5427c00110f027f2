//! Per-queue state and dispatch
//!
//! Every queue pairs a FIFO buffer of undelivered messages with a FIFO list
//! of waiting consumers. Both are guarded by one lock and at most one of
//! them is non-empty once an operation completes.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use pollq_types::Message;
use tracing::trace;

use crate::waiter::{WaitHandle, Waiter, WaiterId};

/// What [`Queue::offer`] did with a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Handed straight to the oldest waiting consumer
    HandedOff(WaiterId),
    /// Appended to the buffer; carries the new buffer length
    Buffered(usize),
}

/// What [`Queue::claim`] found
#[derive(Debug)]
pub enum Claim {
    /// Oldest buffered message, removed from the buffer
    Ready(Message),
    /// Buffer was empty; the consumer is now registered as a waiter
    Waiting(WaitHandle),
}

#[derive(Default)]
struct QueueState {
    buffer: VecDeque<Message>,
    waiters: VecDeque<Waiter>,
}

impl QueueState {
    /// Give `message` to the oldest waiter whose consumer is still there.
    fn hand_off(&mut self, mut message: Message) -> Result<WaiterId, Message> {
        while let Some(waiter) = self.waiters.pop_front() {
            match waiter.deliver(message) {
                Ok(id) => return Ok(id),
                Err(returned) => message = returned,
            }
        }
        Err(message)
    }

    fn check_exclusive(&self) {
        debug_assert!(
            self.buffer.is_empty() || self.waiters.is_empty(),
            "queue has buffered messages and waiting consumers at the same time"
        );
    }
}

/// A named queue
pub struct Queue {
    name: String,
    seq: u64,
    state: Mutex<QueueState>,
}

impl Queue {
    pub(crate) fn new(name: impl Into<String>, seq: u64) -> Self {
        Self {
            name: name.into(),
            seq,
            state: Mutex::new(QueueState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creation order within the registry
    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }

    /// Number of buffered messages
    pub fn len(&self) -> usize {
        self.state.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().buffer.is_empty()
    }

    /// Number of consumers currently waiting
    pub fn waiting(&self) -> usize {
        self.state.lock().waiters.len()
    }

    /// Produce a message: hand it to the oldest waiter, or buffer it.
    pub fn offer(&self, message: Message) -> Dispatch {
        let mut state = self.state.lock();
        let dispatch = match state.hand_off(message) {
            Ok(id) => Dispatch::HandedOff(id),
            Err(message) => {
                state.buffer.push_back(message);
                Dispatch::Buffered(state.buffer.len())
            }
        };
        state.check_exclusive();

        trace!(queue = %self.name, ?dispatch, "Message offered");
        dispatch
    }

    /// Consume a message: take the oldest buffered one, or register a waiter.
    ///
    /// The buffer check and the registration happen under the same lock, so
    /// a concurrent producer either sees the waiter or leaves its message in
    /// the buffer for this call to take.
    pub fn claim(self: &Arc<Self>) -> Claim {
        let mut state = self.state.lock();
        if let Some(message) = state.buffer.pop_front() {
            state.check_exclusive();
            return Claim::Ready(message);
        }

        let (waiter, receiver) = Waiter::channel();
        let id = waiter.id();
        state.waiters.push_back(waiter);
        state.check_exclusive();
        drop(state);

        trace!(queue = %self.name, waiter_id = %id, "Consumer waiting");
        Claim::Waiting(WaitHandle::new(id, Arc::clone(self), receiver))
    }

    /// Remove a waiter by identity.
    ///
    /// Returns `false` if it is no longer registered, meaning a producer has
    /// already delivered to it.
    pub(crate) fn cancel(&self, id: WaiterId) -> bool {
        let mut state = self.state.lock();
        match state.waiters.iter().position(|waiter| waiter.id() == id) {
            Some(index) => {
                state.waiters.remove(index);
                true
            }
            None => false,
        }
    }

    /// Put back a message whose consumer vanished after the handoff.
    ///
    /// It goes to the next waiter if there is one, otherwise to the head of
    /// the buffer since it is older than anything buffered.
    pub(crate) fn reclaim(&self, message: Message) {
        let mut state = self.state.lock();
        if let Err(message) = state.hand_off(message) {
            state.buffer.push_front(message);
        }
        state.check_exclusive();
    }
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Queue")
            .field("name", &self.name)
            .field("buffered", &state.buffer.len())
            .field("waiting", &state.waiters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_exclusive(queue: &Queue) {
        assert!(queue.is_empty() || queue.waiting() == 0, "{:?}", queue);
    }

    #[test]
    fn test_offer_buffers_without_waiters() {
        let queue = Arc::new(Queue::new("orders", 0));
        assert_eq!(queue.offer(Message::new(json!({"a": 1}))), Dispatch::Buffered(1));
        assert_eq!(queue.offer(Message::new(json!({"a": 2}))), Dispatch::Buffered(2));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.waiting(), 0);
    }

    #[test]
    fn test_claim_is_fifo() {
        let queue = Arc::new(Queue::new("orders", 0));
        for i in 0..5 {
            queue.offer(Message::new(json!(i)));
        }
        for i in 0..5 {
            match queue.claim() {
                Claim::Ready(message) => assert_eq!(message.into_content(), json!(i)),
                Claim::Waiting(_) => panic!("buffer drained early"),
            }
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_offer_hands_off_to_oldest_waiter() {
        let queue = Arc::new(Queue::new("jobs", 0));
        let first = match queue.claim() {
            Claim::Waiting(handle) => handle,
            Claim::Ready(_) => panic!("queue should be empty"),
        };
        let second = match queue.claim() {
            Claim::Waiting(handle) => handle,
            Claim::Ready(_) => panic!("queue should be empty"),
        };
        assert_eq!(queue.waiting(), 2);

        assert_eq!(queue.offer(Message::new(json!(1))), Dispatch::HandedOff(first.id()));
        assert_eq!(queue.offer(Message::new(json!(2))), Dispatch::HandedOff(second.id()));
        assert!(queue.is_empty());
        assert_eq!(queue.waiting(), 0);
    }

    #[test]
    fn test_cancel_unknown_waiter() {
        let queue = Arc::new(Queue::new("jobs", 0));
        let handle = match queue.claim() {
            Claim::Waiting(handle) => handle,
            Claim::Ready(_) => panic!("queue should be empty"),
        };
        let id = handle.id();
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
    }

    #[test]
    fn test_state_stays_exclusive() {
        let queue = Arc::new(Queue::new("mixed", 0));
        let mut handles = Vec::new();

        for _ in 0..3 {
            if let Claim::Waiting(handle) = queue.claim() {
                handles.push(handle);
            }
            assert_exclusive(&queue);
        }
        for i in 0..5 {
            queue.offer(Message::new(json!(i)));
            assert_exclusive(&queue);
        }
        assert_eq!(queue.len(), 2);
        let mut claims = Vec::new();
        for _ in 0..3 {
            claims.push(queue.claim());
            assert_exclusive(&queue);
        }
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.waiting(), 1);
    }
}
