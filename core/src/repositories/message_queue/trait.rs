//! Retry-queue repository interface for pending SMS messages.

use async_trait::async_trait;

use crate::domain::entities::pending_message::PendingMessage;
use crate::errors::DomainResult;

/// Persistence contract for the asynchronous retry queue
///
/// The queue is drained by background consumers that may run on several
/// machines at once, so `claim_next` must combine the locking read with
/// the `retry_count` increment and `last_attempt_at` refresh in one
/// atomic step: at most one consumer holds an active claim on a message
/// until its lease expires.
#[async_trait]
pub trait MessageQueueRepository: Send + Sync {
    /// Persist a new waiting message and return its assigned id
    async fn insert(&self, message: PendingMessage) -> DomainResult<i64>;

    /// Atomically claim the next deliverable message
    ///
    /// A message is deliverable when its status is `Waiting` and its
    /// `last_attempt_at` is older than the claim lease, which also makes
    /// abandoned claims reclaimable. Claiming increments `retry_count`
    /// and refreshes `last_attempt_at`. `Ok(None)` is the normal idle
    /// outcome, not an error.
    async fn claim_next(&self) -> DomainResult<Option<PendingMessage>>;

    /// Mark a message as delivered
    async fn mark_success(&self, id: i64) -> DomainResult<()>;

    /// Mark a message as permanently failed
    ///
    /// Only takes effect once `retry_count >= retry_max`; the guard lives
    /// in the store so a racing consumer cannot fail a message early.
    async fn mark_failed(&self, id: i64) -> DomainResult<()>;
}
