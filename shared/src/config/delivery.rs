//! Delivery configuration module
//!
//! Settings for the provider failover strategies and the adaptive
//! sync/async dispatcher.

use serde::{Deserialize, Serialize};

/// Delivery configuration covering failover and async dispatch
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeliveryConfig {
    /// Which failover strategy to assemble ("sequential", "timeout", "error-rate")
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Consecutive timeouts before the timeout strategy rotates providers
    pub timeout_rotation_threshold: u32,

    /// Error rate (0.0 - 1.0) above which the error-rate strategy rotates
    pub error_rate_threshold: f64,

    /// Trailing window for error-rate accounting, in seconds
    pub error_rate_window_seconds: u64,

    /// Consecutive slow responses before the dispatcher prefers async
    pub slow_response_threshold: u32,

    /// Milliseconds above which a synchronous send counts as slow
    pub slow_response_millis: u64,

    /// Maximum delivery attempts for a queued message
    pub retry_max: u32,

    /// Seconds a claimed message is leased before it may be reclaimed
    pub claim_lease_seconds: u64,

    /// Per-attempt deadline for provider calls from the consumer, in seconds
    pub attempt_timeout_seconds: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            timeout_rotation_threshold: 3,
            error_rate_threshold: 0.5,
            error_rate_window_seconds: 60,
            slow_response_threshold: 10,
            slow_response_millis: 1000,
            retry_max: 3,
            claim_lease_seconds: 60,
            attempt_timeout_seconds: 1,
        }
    }
}

fn default_strategy() -> String {
    "sequential".to_string()
}
