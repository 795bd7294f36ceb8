//! In-memory mock implementation of MessageQueueRepository for testing

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::entities::pending_message::{MessageStatus, PendingMessage};
use crate::errors::{DomainError, DomainResult};

use super::r#trait::MessageQueueRepository;

/// Mock message queue for testing
///
/// Mirrors the claim semantics of the MySQL implementation: one mutex
/// guards the whole table, so the locking read and the retry bump are a
/// single atomic step from the point of view of racing claimers.
pub struct MockMessageQueueRepository {
    messages: Arc<Mutex<Vec<PendingMessage>>>,
    next_id: Arc<Mutex<i64>>,
    claim_lease: Duration,
    fail_inserts: bool,
}

impl MockMessageQueueRepository {
    /// Create a mock queue with a zero lease, so fresh messages are
    /// claimable immediately
    pub fn new() -> Self {
        Self::with_lease(Duration::zero())
    }

    /// Create a mock queue with the given claim lease
    pub fn with_lease(claim_lease: Duration) -> Self {
        Self {
            messages: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(Mutex::new(1)),
            claim_lease,
            fail_inserts: false,
        }
    }

    /// Make every insert fail with a store error
    pub fn failing_inserts() -> Self {
        Self {
            fail_inserts: true,
            ..Self::new()
        }
    }

    /// Snapshot a message by id
    pub async fn get(&self, id: i64) -> Option<PendingMessage> {
        let messages = self.messages.lock().await;
        messages.iter().find(|m| m.id == id).cloned()
    }

    /// Number of messages currently stored
    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }

    /// Whether the queue holds no messages
    pub async fn is_empty(&self) -> bool {
        self.messages.lock().await.is_empty()
    }
}

impl Default for MockMessageQueueRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageQueueRepository for MockMessageQueueRepository {
    async fn insert(&self, mut message: PendingMessage) -> DomainResult<i64> {
        if self.fail_inserts {
            return Err(DomainError::StoreUnavailable {
                message: "mock insert failure".to_string(),
            });
        }

        let mut next_id = self.next_id.lock().await;
        message.id = *next_id;
        *next_id += 1;

        let id = message.id;
        self.messages.lock().await.push(message);
        Ok(id)
    }

    async fn claim_next(&self) -> DomainResult<Option<PendingMessage>> {
        let mut messages = self.messages.lock().await;
        let cutoff = Utc::now() - self.claim_lease;

        let claimable = messages
            .iter_mut()
            .find(|m| m.status == MessageStatus::Waiting && m.last_attempt_at <= cutoff);

        match claimable {
            Some(message) => {
                message.retry_count += 1;
                message.last_attempt_at = Utc::now();
                Ok(Some(message.clone()))
            }
            None => Ok(None),
        }
    }

    async fn mark_success(&self, id: i64) -> DomainResult<()> {
        let mut messages = self.messages.lock().await;
        if let Some(message) = messages.iter_mut().find(|m| m.id == id) {
            message.status = MessageStatus::Success;
        }
        Ok(())
    }

    async fn mark_failed(&self, id: i64) -> DomainResult<()> {
        let mut messages = self.messages.lock().await;
        if let Some(message) = messages.iter_mut().find(|m| m.id == id) {
            // Same guard as the SQL implementation
            if message.retries_exhausted() {
                message.status = MessageStatus::Failed;
            }
        }
        Ok(())
    }
}
