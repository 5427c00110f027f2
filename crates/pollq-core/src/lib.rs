//! PollQ Core - Queue registry and consumer matching engine
//!
//! This crate contains:
//! - Broker: produce / consume / listing entry points
//! - QueueRegistry: lazily created named queues
//! - Queue: buffered messages and waiting consumers, dispatched under one lock
//! - WaitHandle: a suspended long-poll consumer with a deadline

pub mod broker;
pub mod config;
pub mod queue;
pub mod registry;
pub mod waiter;

// Re-exports
pub use broker::Broker;
pub use config::BrokerConfig;
pub use queue::{Claim, Dispatch, Queue};
pub use registry::QueueRegistry;
pub use waiter::{WaitHandle, WaiterId};
