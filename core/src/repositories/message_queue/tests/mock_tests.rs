//! Tests for the mock message queue claim semantics

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;

use crate::domain::entities::pending_message::{MessageStatus, PendingMessage};
use crate::repositories::message_queue::mock::MockMessageQueueRepository;
use crate::repositories::message_queue::r#trait::MessageQueueRepository;

fn waiting_message() -> PendingMessage {
    PendingMessage::new(
        "tpl-login",
        vec!["123456".to_string()],
        vec!["+15212341234".to_string()],
        3,
    )
}

#[tokio::test]
async fn insert_assigns_sequential_ids() {
    let repo = MockMessageQueueRepository::new();
    let first = repo.insert(waiting_message()).await.unwrap();
    let second = repo.insert(waiting_message()).await.unwrap();
    assert_eq!(second, first + 1);
}

#[tokio::test]
async fn claim_bumps_retry_count_and_refreshes_attempt_time() {
    let repo = MockMessageQueueRepository::new();
    let id = repo.insert(waiting_message()).await.unwrap();

    let claimed = repo.claim_next().await.unwrap().unwrap();
    assert_eq!(claimed.id, id);
    assert_eq!(claimed.retry_count, 1);
    assert_eq!(claimed.status, MessageStatus::Waiting);
}

#[tokio::test]
async fn claimed_message_is_leased_until_the_window_expires() {
    let repo = MockMessageQueueRepository::with_lease(Duration::seconds(60));
    let mut message = waiting_message();
    // Back-date so the first claim succeeds despite the 60s lease
    message.last_attempt_at = chrono::Utc::now() - Duration::seconds(120);
    repo.insert(message).await.unwrap();

    assert!(repo.claim_next().await.unwrap().is_some());
    // The refreshed last_attempt_at now sits inside the lease window
    assert!(repo.claim_next().await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_claimers_never_share_a_message() {
    let repo = Arc::new(MockMessageQueueRepository::new());
    for _ in 0..8 {
        repo.insert(waiting_message()).await.unwrap();
    }

    let mut handles = Vec::new();
    for _ in 0..16 {
        let repo = Arc::clone(&repo);
        handles.push(tokio::spawn(async move { repo.claim_next().await.unwrap() }));
    }

    let mut seen = HashSet::new();
    for handle in handles {
        if let Some(message) = handle.await.unwrap() {
            assert!(
                seen.insert(message.id),
                "message {} claimed twice",
                message.id
            );
        }
    }
    assert_eq!(seen.len(), 8);
}

#[tokio::test]
async fn mark_failed_requires_exhausted_retries() {
    let repo = MockMessageQueueRepository::new();
    let id = repo.insert(waiting_message()).await.unwrap();

    // Two claims: retry_count = 2 < retry_max = 3, mark_failed is a no-op
    repo.claim_next().await.unwrap().unwrap();
    repo.claim_next().await.unwrap().unwrap();
    repo.mark_failed(id).await.unwrap();
    assert_eq!(repo.get(id).await.unwrap().status, MessageStatus::Waiting);

    // Third claim exhausts the budget and the failure sticks
    repo.claim_next().await.unwrap().unwrap();
    repo.mark_failed(id).await.unwrap();
    assert_eq!(repo.get(id).await.unwrap().status, MessageStatus::Failed);
}

#[tokio::test]
async fn terminal_messages_are_never_reclaimed() {
    let repo = MockMessageQueueRepository::new();
    let id = repo.insert(waiting_message()).await.unwrap();

    repo.claim_next().await.unwrap().unwrap();
    repo.mark_success(id).await.unwrap();

    assert_eq!(repo.get(id).await.unwrap().status, MessageStatus::Success);
    assert!(repo.claim_next().await.unwrap().is_none());
    // Never deleted, lifecycle just ends
    assert_eq!(repo.len().await, 1);
}
