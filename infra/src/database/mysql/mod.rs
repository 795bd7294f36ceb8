//! MySQL repository implementations

pub mod message_queue_repository_impl;

pub use message_queue_repository_impl::MySqlMessageQueueRepository;
