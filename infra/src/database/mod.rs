//! MySQL persistence for the delivery retry queue

pub mod connection;
pub mod mysql;

pub use connection::create_pool;
pub use mysql::MySqlMessageQueueRepository;
