//! Repository interfaces for persisted state.

pub mod message_queue;

pub use message_queue::MessageQueueRepository;
