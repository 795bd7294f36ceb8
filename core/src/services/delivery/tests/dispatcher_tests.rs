//! Tests for the adaptive sync/async dispatcher

use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::entities::pending_message::MessageStatus;
use crate::errors::DomainError;
use crate::repositories::message_queue::mock::MockMessageQueueRepository;
use crate::services::delivery::dispatcher::{AsyncSmsDispatcher, DispatcherConfig};

use super::mocks::{MockRateLimiter, ScriptedProvider};

fn recipients() -> Vec<String> {
    vec!["+15212341234".to_string()]
}

fn test_config() -> DispatcherConfig {
    DispatcherConfig {
        slow_response_threshold: 3,
        slow_response_latency: Duration::from_millis(20),
        retry_max: 3,
        claim_timeout: Duration::from_secs(1),
        attempt_timeout: Duration::from_secs(1),
        idle_sleep: Duration::from_millis(10),
        limiter_key: "sms_dispatch:test".to_string(),
    }
}

/// Queue whose fresh inserts sit out a long lease, keeping the consumer
/// away from routing assertions
fn leased_queue() -> Arc<MockMessageQueueRepository> {
    Arc::new(MockMessageQueueRepository::with_lease(
        ChronoDuration::seconds(300),
    ))
}

/// Poll until the message reaches the expected status or the deadline
/// passes
async fn wait_for_status(
    queue: &MockMessageQueueRepository,
    id: i64,
    expected: MessageStatus,
) -> bool {
    for _ in 0..100 {
        if queue.get(id).await.map(|m| m.status) == Some(expected) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn routes_sync_when_admitted() {
    let provider = Arc::new(ScriptedProvider::succeeding("primary"));
    let queue = leased_queue();
    let dispatcher = AsyncSmsDispatcher::new(
        provider.clone(),
        queue.clone(),
        Arc::new(MockRateLimiter::admitting()),
        test_config(),
    );

    dispatcher.send("tpl", &[], &recipients()).await.unwrap();

    assert_eq!(provider.calls(), 1);
    assert!(queue.is_empty().await);
    dispatcher.shutdown();
}

#[tokio::test]
async fn routes_async_when_limited() {
    let provider = Arc::new(ScriptedProvider::succeeding("primary"));
    let queue = leased_queue();
    let dispatcher = AsyncSmsDispatcher::new(
        provider.clone(),
        queue.clone(),
        Arc::new(MockRateLimiter::limiting()),
        test_config(),
    );

    dispatcher.send("tpl", &[], &recipients()).await.unwrap();

    assert_eq!(provider.calls(), 0);
    assert_eq!(queue.len().await, 1);
    dispatcher.shutdown();
}

#[tokio::test]
async fn limiter_outage_counts_as_failed_admission() {
    let provider = Arc::new(ScriptedProvider::succeeding("primary"));
    let queue = leased_queue();
    let dispatcher = AsyncSmsDispatcher::new(
        provider.clone(),
        queue.clone(),
        Arc::new(MockRateLimiter::unavailable()),
        test_config(),
    );

    // Fail-closed: the send is queued instead of dispatched directly
    dispatcher.send("tpl", &[], &recipients()).await.unwrap();

    assert_eq!(provider.calls(), 0);
    assert_eq!(queue.len().await, 1);
    dispatcher.shutdown();
}

#[tokio::test]
async fn async_route_surfaces_persistence_failures() {
    let provider = Arc::new(ScriptedProvider::succeeding("primary"));
    let queue = Arc::new(MockMessageQueueRepository::failing_inserts());
    let dispatcher = AsyncSmsDispatcher::new(
        provider,
        queue,
        Arc::new(MockRateLimiter::limiting()),
        test_config(),
    );

    let err = dispatcher.send("tpl", &[], &recipients()).await.unwrap_err();
    assert!(matches!(err, DomainError::StoreUnavailable { .. }));
    dispatcher.shutdown();
}

#[tokio::test]
async fn slow_responses_trip_the_counter_and_success_resets_it() {
    let provider = Arc::new(ScriptedProvider::slow_then_fast(
        "primary",
        2,
        Duration::from_millis(40),
    ));
    let queue = leased_queue();
    let dispatcher = AsyncSmsDispatcher::new(
        provider.clone(),
        queue.clone(),
        Arc::new(MockRateLimiter::admitting()),
        test_config(),
    );

    // Two sends above the 20ms latency bar
    dispatcher.send("tpl", &[], &recipients()).await.unwrap();
    dispatcher.send("tpl", &[], &recipients()).await.unwrap();
    assert_eq!(dispatcher.slow_count(), 2);

    // A fast success resets the streak
    dispatcher.send("tpl", &[], &recipients()).await.unwrap();
    assert_eq!(dispatcher.slow_count(), 0);
    assert!(queue.is_empty().await);
    dispatcher.shutdown();
}

#[tokio::test]
async fn saturated_dispatcher_prefers_async_with_recovery_probes() {
    // Stays slow forever, so every synchronous probe keeps the counter
    // at or above the threshold
    let provider = Arc::new(ScriptedProvider::slow(
        "primary",
        Duration::from_millis(25),
    ));
    let queue = leased_queue();
    let dispatcher = AsyncSmsDispatcher::new(
        provider.clone(),
        queue.clone(),
        Arc::new(MockRateLimiter::admitting()),
        test_config(),
    );

    // Trip the threshold with three slow synchronous sends
    for _ in 0..3 {
        dispatcher.send("tpl", &[], &recipients()).await.unwrap();
    }
    assert_eq!(dispatcher.slow_count(), 3);

    // Statistical property: roughly 90% of the next sends are queued
    // and roughly 10% go through as synchronous recovery probes.
    let trials = 200;
    for _ in 0..trials {
        dispatcher.send("tpl", &[], &recipients()).await.unwrap();
    }
    let queued = queue.len().await as u32;
    let probes = provider.calls() - 3;

    assert_eq!(queued + probes, trials);
    assert!(queued >= 150, "expected mostly async, got {queued}/{trials}");
    assert!(probes >= 1, "expected at least one recovery probe");
    dispatcher.shutdown();
}

#[tokio::test]
async fn consumer_delivers_queued_messages() {
    let provider = Arc::new(ScriptedProvider::succeeding("primary"));
    // Zero lease: queued messages are claimable immediately
    let queue = Arc::new(MockMessageQueueRepository::new());
    let dispatcher = AsyncSmsDispatcher::new(
        provider.clone(),
        queue.clone(),
        Arc::new(MockRateLimiter::limiting()),
        test_config(),
    );

    dispatcher.send("tpl", &[], &recipients()).await.unwrap();

    assert!(wait_for_status(&queue, 1, MessageStatus::Success).await);
    assert_eq!(provider.calls(), 1);
    assert_eq!(queue.get(1).await.unwrap().retry_count, 1);
    dispatcher.shutdown();
}

#[tokio::test]
async fn consumer_marks_failed_only_after_retry_budget_is_spent() {
    let provider = Arc::new(ScriptedProvider::failing("primary"));
    let queue = Arc::new(MockMessageQueueRepository::new());
    let dispatcher = AsyncSmsDispatcher::new(
        provider.clone(),
        queue.clone(),
        Arc::new(MockRateLimiter::limiting()),
        test_config(),
    );

    dispatcher.send("tpl", &[], &recipients()).await.unwrap();

    assert!(wait_for_status(&queue, 1, MessageStatus::Failed).await);
    let message = queue.get(1).await.unwrap();
    assert_eq!(message.retry_count, message.retry_max);
    assert_eq!(provider.calls(), message.retry_max);
    dispatcher.shutdown();
}

#[tokio::test]
async fn consumer_treats_attempt_timeouts_as_failures() {
    // Slower than the 50ms attempt deadline
    let provider = Arc::new(ScriptedProvider::slow(
        "primary",
        Duration::from_millis(200),
    ));
    let queue = Arc::new(MockMessageQueueRepository::new());
    let config = DispatcherConfig {
        attempt_timeout: Duration::from_millis(50),
        ..test_config()
    };
    let dispatcher = AsyncSmsDispatcher::new(
        provider,
        queue.clone(),
        Arc::new(MockRateLimiter::limiting()),
        config,
    );

    dispatcher.send("tpl", &[], &recipients()).await.unwrap();

    assert!(wait_for_status(&queue, 1, MessageStatus::Failed).await);
    dispatcher.shutdown();
}

#[tokio::test]
async fn consumer_is_restarted_after_a_provider_panic() {
    let provider = Arc::new(ScriptedProvider::panicking_then_succeeding("primary", 1));
    let queue = Arc::new(MockMessageQueueRepository::new());
    let dispatcher = AsyncSmsDispatcher::new(
        provider.clone(),
        queue.clone(),
        Arc::new(MockRateLimiter::limiting()),
        test_config(),
    );

    dispatcher.send("tpl", &[], &recipients()).await.unwrap();

    // The first attempt panics the consumer task; the supervisor
    // respawns it and the reclaimed message still gets delivered.
    assert!(wait_for_status(&queue, 1, MessageStatus::Success).await);
    assert_eq!(provider.calls(), 2);
    dispatcher.shutdown();
}

#[tokio::test]
async fn shutdown_aborts_an_in_flight_delivery() {
    let provider = Arc::new(ScriptedProvider::slow("primary", Duration::from_secs(2)));
    let queue = Arc::new(MockMessageQueueRepository::new());
    let config = DispatcherConfig {
        // Deadline far beyond the provider's delay, so only shutdown
        // can end the attempt early
        attempt_timeout: Duration::from_secs(5),
        ..test_config()
    };
    let dispatcher = AsyncSmsDispatcher::new(
        provider.clone(),
        queue.clone(),
        Arc::new(MockRateLimiter::limiting()),
        config,
    );

    dispatcher.send("tpl", &[], &recipients()).await.unwrap();

    // Wait for the consumer to start the provider call
    for _ in 0..100 {
        if provider.calls() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(provider.calls(), 1);

    dispatcher.shutdown();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // The attempt was abandoned, not awaited: no outcome was recorded,
    // and the claimed message waits for its lease to lapse.
    let message = queue.get(1).await.unwrap();
    assert_eq!(message.status, MessageStatus::Waiting);
    assert_eq!(message.retry_count, 1);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn shutdown_stops_the_consumer() {
    let provider = Arc::new(ScriptedProvider::succeeding("primary"));
    let queue = Arc::new(MockMessageQueueRepository::new());
    let dispatcher = AsyncSmsDispatcher::new(
        provider.clone(),
        queue.clone(),
        Arc::new(MockRateLimiter::limiting()),
        test_config(),
    );

    dispatcher.shutdown();
    // Let the consumer observe the signal while the queue is empty
    tokio::time::sleep(Duration::from_millis(50)).await;

    dispatcher.send("tpl", &[], &recipients()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(queue.get(1).await.unwrap().status, MessageStatus::Waiting);
    assert_eq!(provider.calls(), 0);
}
