//! Queue registry
//!
//! Maps queue names to queues. Queues are created on first reference and
//! live for as long as the registry does.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use pollq_types::QueueSummary;
use tracing::info;

use crate::queue::Queue;

/// Process-wide set of named queues
pub struct QueueRegistry {
    /// Queues stored by name (case-sensitive, no normalization)
    queues: DashMap<String, Arc<Queue>>,
    next_seq: AtomicU64,
}

impl QueueRegistry {
    pub fn new() -> Self {
        Self {
            queues: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Return the queue called `name`, creating an empty one if needed
    pub fn get_or_create(&self, name: &str) -> Arc<Queue> {
        if let Some(queue) = self.queues.get(name) {
            return Arc::clone(queue.value());
        }

        let entry = self.queues.entry(name.to_string()).or_insert_with(|| {
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            info!(queue = %name, "Queue created");
            Arc::new(Queue::new(name, seq))
        });
        Arc::clone(entry.value())
    }

    /// Look up a queue without creating it
    pub fn get(&self, name: &str) -> Option<Arc<Queue>> {
        self.queues.get(name).map(|queue| Arc::clone(queue.value()))
    }

    /// Snapshot of every queue and its buffered-message count, in creation order
    pub fn list(&self) -> Vec<QueueSummary> {
        let mut queues: Vec<Arc<Queue>> = self
            .queues
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        queues.sort_by_key(|queue| queue.seq());

        queues
            .iter()
            .map(|queue| QueueSummary {
                name: queue.name().to_string(),
                message_count: queue.len() as u64,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

impl Default for QueueRegistry {
    fn default() -> Self {
        Self::new()
    }
}
