//! Pending message entity for asynchronous SMS delivery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default maximum delivery attempts for a queued message
pub const DEFAULT_RETRY_MAX: u32 = 3;

/// Lifecycle status of a queued message
///
/// `Waiting` messages are eligible for claiming by a background consumer.
/// `Success` and `Failed` are terminal; messages are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Waiting,
    Success,
    Failed,
}

impl MessageStatus {
    /// Storage representation used by the queue table
    pub fn as_u8(self) -> u8 {
        match self {
            MessageStatus::Waiting => 0,
            MessageStatus::Success => 1,
            MessageStatus::Failed => 2,
        }
    }

    /// Parse the storage representation back into a status
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(MessageStatus::Waiting),
            1 => Some(MessageStatus::Success),
            2 => Some(MessageStatus::Failed),
            _ => None,
        }
    }
}

/// A message persisted for asynchronous delivery
///
/// Created by `AsyncSmsDispatcher::send` when a call is routed
/// asynchronously. Mutated only through the queue repository: claiming
/// bumps `retry_count` and refreshes `last_attempt_at`; the consumer
/// reports the terminal status after delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMessage {
    /// Queue-assigned identifier
    pub id: i64,

    /// Provider template identifier
    pub template_id: String,

    /// Template arguments, in template order
    pub args: Vec<String>,

    /// Recipient phone numbers
    pub recipients: Vec<String>,

    /// Delivery attempts made so far
    pub retry_count: u32,

    /// Maximum delivery attempts before the message is marked failed
    pub retry_max: u32,

    /// Current lifecycle status
    pub status: MessageStatus,

    /// When the message was created
    pub created_at: DateTime<Utc>,

    /// When the message was last claimed for delivery
    pub last_attempt_at: DateTime<Utc>,
}

impl PendingMessage {
    /// Build a new waiting message ready for insertion
    ///
    /// The queue assigns the real id on insert; `id` starts at 0.
    pub fn new(
        template_id: impl Into<String>,
        args: Vec<String>,
        recipients: Vec<String>,
        retry_max: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            template_id: template_id.into(),
            args,
            recipients,
            retry_count: 0,
            retry_max,
            status: MessageStatus::Waiting,
            created_at: now,
            last_attempt_at: now,
        }
    }

    /// Whether the message has used up its delivery attempts
    pub fn retries_exhausted(&self) -> bool {
        self.retry_count >= self.retry_max
    }
}
