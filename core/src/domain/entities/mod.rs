//! Domain entities representing core business objects.

pub mod pending_message;

// Re-export commonly used types
pub use pending_message::{MessageStatus, PendingMessage, DEFAULT_RETRY_MAX};
