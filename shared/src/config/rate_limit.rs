//! Rate limiting configuration module

use serde::{Deserialize, Serialize};

/// Sliding-window rate limit configuration
///
/// A window admits at most `capacity` events per `window_seconds` for a
/// given key. The window slides continuously; expired events are trimmed
/// as part of the admission decision itself.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Maximum number of events admitted within one window
    pub capacity: u32,

    /// Window length in seconds
    pub window_seconds: u64,

    /// Key prefix for limiter entries in the shared store
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 100,
            window_seconds: 1,
            key_prefix: default_key_prefix(),
        }
    }
}

impl RateLimitConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let capacity = std::env::var("RATE_LIMIT_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);
        let window_seconds = std::env::var("RATE_LIMIT_WINDOW_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);

        Self {
            enabled: true,
            capacity,
            window_seconds,
            key_prefix: default_key_prefix(),
        }
    }

    /// Window length in milliseconds, as used by the store script
    pub fn window_millis(&self) -> i64 {
        (self.window_seconds as i64) * 1000
    }
}

fn default_enabled() -> bool {
    true
}

fn default_key_prefix() -> String {
    "sms_limiter".to_string()
}
