//! Redis-backed sliding-window rate limiter
//!
//! The whole admission decision runs as one Lua script: trim expired
//! events, count the rest, and either record the new event or refuse it.
//! Counting and recording on the client would race against other
//! instances sharing the same window.

use async_trait::async_trait;
use chrono::Utc;
use redis::Script;
use std::sync::Arc;
use tracing::debug;

use relay_core::services::delivery::RateLimiter;
use relay_core::{DomainError, DomainResult};
use relay_shared::config::rate_limit::RateLimitConfig;

use crate::cache::redis_client::RedisClient;
use crate::InfrastructureError;

/// Events live in a sorted set scored by their millisecond timestamp.
/// Returns 1 when the window is full (the event is not recorded) and 0
/// when the event was admitted and recorded.
const SLIDE_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local window = tonumber(ARGV[1])
local capacity = tonumber(ARGV[2])
local now = tonumber(ARGV[3])
local min = now - window
redis.call("ZREMRANGEBYSCORE", key, "-inf", min)
local cnt = redis.call("ZCOUNT", key, "-inf", "+inf")
if cnt >= capacity then
    return 1
else
    redis.call("ZADD", key, now, now)
    redis.call("PEXPIRE", key, window)
    return 0
end
"#;

/// Redis implementation of the sliding-window limiter
pub struct RedisSlidingWindowLimiter {
    client: Arc<RedisClient>,
    config: RateLimitConfig,
    script: Script,
}

impl RedisSlidingWindowLimiter {
    /// Create a new limiter over an existing client
    pub fn new(client: Arc<RedisClient>, config: RateLimitConfig) -> Self {
        Self {
            client,
            config,
            script: Script::new(SLIDE_WINDOW_SCRIPT),
        }
    }

    fn window_key(&self, key: &str) -> String {
        window_key(&self.config.key_prefix, key)
    }
}

fn window_key(prefix: &str, key: &str) -> String {
    format!("{}:{}", prefix, key)
}

#[async_trait]
impl RateLimiter for RedisSlidingWindowLimiter {
    async fn limit(&self, key: &str) -> DomainResult<bool> {
        if !self.config.enabled {
            return Ok(false);
        }

        let window_key = self.window_key(key);
        let mut conn = self.client.connection();

        let verdict: i64 = self
            .script
            .key(&window_key)
            .arg(self.config.window_millis())
            .arg(self.config.capacity)
            .arg(Utc::now().timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| DomainError::from(InfrastructureError::Cache(e)))?;

        let limited = verdict == 1;
        if limited {
            debug!(key = %window_key, "window full; event refused");
        }
        Ok(limited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_keys_carry_the_configured_prefix() {
        assert_eq!(window_key("sms_limiter", "dispatch"), "sms_limiter:dispatch");
    }
}
