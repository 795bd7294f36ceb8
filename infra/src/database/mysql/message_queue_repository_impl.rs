//! MySQL implementation of the MessageQueueRepository trait.
//!
//! Messages live in the `pending_messages` table:
//!
//! ```sql
//! CREATE TABLE pending_messages (
//!     id              BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
//!     template_id     VARCHAR(128)    NOT NULL,
//!     args            TEXT            NOT NULL,
//!     recipients      TEXT            NOT NULL,
//!     retry_count     INT UNSIGNED    NOT NULL DEFAULT 0,
//!     retry_max       INT UNSIGNED    NOT NULL,
//!     status          TINYINT UNSIGNED NOT NULL DEFAULT 0,
//!     created_at      DATETIME(3)     NOT NULL,
//!     last_attempt_at DATETIME(3)     NOT NULL,
//!     INDEX idx_status_last_attempt (status, last_attempt_at)
//! );
//! ```
//!
//! Claiming runs inside one transaction with `SELECT ... FOR UPDATE`:
//! the locking read, the `retry_count` increment, and the
//! `last_attempt_at` refresh commit together, so concurrent consumers
//! on separate machines never hold the same message inside a lease.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::debug;

use relay_core::domain::entities::pending_message::{MessageStatus, PendingMessage};
use relay_core::errors::{DomainError, DomainResult};
use relay_core::repositories::MessageQueueRepository;
use relay_shared::config::delivery::DeliveryConfig;

use crate::InfrastructureError;

/// MySQL implementation of the retry-queue repository
pub struct MySqlMessageQueueRepository {
    /// Database connection pool
    pool: MySqlPool,
    /// How long a claim stays exclusive before the message is reclaimable
    claim_lease: Duration,
}

impl MySqlMessageQueueRepository {
    /// Create a new MySQL queue repository
    pub fn new(pool: MySqlPool, config: &DeliveryConfig) -> Self {
        Self {
            pool,
            claim_lease: Duration::seconds(config.claim_lease_seconds as i64),
        }
    }

    fn row_to_message(row: &MySqlRow) -> DomainResult<PendingMessage> {
        let args_json: String = row
            .try_get("args")
            .map_err(|e| DomainError::from(InfrastructureError::Database(e)))?;
        let recipients_json: String = row
            .try_get("recipients")
            .map_err(|e| DomainError::from(InfrastructureError::Database(e)))?;

        let args: Vec<String> = serde_json::from_str(&args_json).map_err(|e| {
            DomainError::Internal {
                message: format!("corrupt args column: {}", e),
            }
        })?;
        let recipients: Vec<String> = serde_json::from_str(&recipients_json).map_err(|e| {
            DomainError::Internal {
                message: format!("corrupt recipients column: {}", e),
            }
        })?;

        let status_raw: u8 = row
            .try_get("status")
            .map_err(|e| DomainError::from(InfrastructureError::Database(e)))?;
        let status = MessageStatus::from_u8(status_raw).ok_or_else(|| DomainError::Internal {
            message: format!("unknown message status: {}", status_raw),
        })?;

        Ok(PendingMessage {
            id: row
                .try_get::<i64, _>("id")
                .map_err(|e| DomainError::from(InfrastructureError::Database(e)))?,
            template_id: row
                .try_get("template_id")
                .map_err(|e| DomainError::from(InfrastructureError::Database(e)))?,
            args,
            recipients,
            retry_count: row
                .try_get::<u32, _>("retry_count")
                .map_err(|e| DomainError::from(InfrastructureError::Database(e)))?,
            retry_max: row
                .try_get::<u32, _>("retry_max")
                .map_err(|e| DomainError::from(InfrastructureError::Database(e)))?,
            status,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| DomainError::from(InfrastructureError::Database(e)))?,
            last_attempt_at: row
                .try_get::<DateTime<Utc>, _>("last_attempt_at")
                .map_err(|e| DomainError::from(InfrastructureError::Database(e)))?,
        })
    }
}

#[async_trait]
impl MessageQueueRepository for MySqlMessageQueueRepository {
    async fn insert(&self, message: PendingMessage) -> DomainResult<i64> {
        let args_json = serde_json::to_string(&message.args).map_err(|e| {
            DomainError::Internal {
                message: format!("failed to encode args: {}", e),
            }
        })?;
        let recipients_json = serde_json::to_string(&message.recipients).map_err(|e| {
            DomainError::Internal {
                message: format!("failed to encode recipients: {}", e),
            }
        })?;

        let query = r#"
            INSERT INTO pending_messages
                (template_id, args, recipients, retry_count, retry_max,
                 status, created_at, last_attempt_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        let result = sqlx::query(query)
            .bind(&message.template_id)
            .bind(args_json)
            .bind(recipients_json)
            .bind(message.retry_count)
            .bind(message.retry_max)
            .bind(message.status.as_u8())
            .bind(message.created_at)
            .bind(message.last_attempt_at)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::from(InfrastructureError::Database(e)))?;

        let id = result.last_insert_id() as i64;
        debug!(id, "pending message persisted");
        Ok(id)
    }

    async fn claim_next(&self) -> DomainResult<Option<PendingMessage>> {
        let cutoff = Utc::now() - self.claim_lease;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::from(InfrastructureError::Database(e)))?;

        let select = r#"
            SELECT id, template_id, args, recipients, retry_count, retry_max,
                   status, created_at, last_attempt_at
            FROM pending_messages
            WHERE status = 0 AND last_attempt_at < ?
            ORDER BY last_attempt_at ASC
            LIMIT 1
            FOR UPDATE
        "#;

        let row = sqlx::query(select)
            .bind(cutoff)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| DomainError::from(InfrastructureError::Database(e)))?;

        let Some(row) = row else {
            tx.commit()
                .await
                .map_err(|e| DomainError::from(InfrastructureError::Database(e)))?;
            return Ok(None);
        };

        let mut message = Self::row_to_message(&row)?;
        let now = Utc::now();

        sqlx::query(
            "UPDATE pending_messages SET retry_count = retry_count + 1, last_attempt_at = ? WHERE id = ?",
        )
        .bind(now)
        .bind(message.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::from(InfrastructureError::Database(e)))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::from(InfrastructureError::Database(e)))?;

        message.retry_count += 1;
        message.last_attempt_at = now;
        debug!(id = message.id, retry_count = message.retry_count, "message claimed");
        Ok(Some(message))
    }

    async fn mark_success(&self, id: i64) -> DomainResult<()> {
        sqlx::query("UPDATE pending_messages SET status = 1, last_attempt_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::from(InfrastructureError::Database(e)))?;
        Ok(())
    }

    async fn mark_failed(&self, id: i64) -> DomainResult<()> {
        // The retry-budget guard lives here so a racing consumer cannot
        // fail a message that still has attempts left.
        sqlx::query(
            "UPDATE pending_messages SET status = 2, last_attempt_at = ? WHERE id = ? AND retry_count >= retry_max",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::from(InfrastructureError::Database(e)))?;
        Ok(())
    }
}
