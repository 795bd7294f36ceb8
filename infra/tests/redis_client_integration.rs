//! Integration tests for the Redis client
//!
//! These tests require Redis to be running locally on port 6379.
//! Run with: cargo test --test redis_client_integration -- --ignored

use relay_infra::cache::{CacheConfig, RedisClient};
use relay_infra::InfrastructureError;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn health_check_pings_the_store() {
    init_tracing();
    let client = RedisClient::new(CacheConfig::new("redis://localhost:6379"))
        .await
        .expect("Failed to create Redis client");

    assert!(client.health_check().await.unwrap());
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn a_malformed_url_is_a_config_error() {
    init_tracing();
    let err = RedisClient::new(CacheConfig::new("not a url"))
        .await
        .unwrap_err();
    assert!(matches!(err, InfrastructureError::Config(_)));
}
