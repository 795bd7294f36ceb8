//! SMS delivery policies
//!
//! This module contains the provider-facing half of the delivery core:
//! - The `SmsProvider` capability every concrete provider implements
//! - Failover strategies that compose providers behind that same
//!   capability (sequential, timeout-count, error-rate-windowed)
//! - A rate-limiting provider decorator
//! - The adaptive sync/async dispatcher with its persisted retry queue

mod dispatcher;
mod error_rate_failover;
mod rate_limited;
mod sequential;
mod timeout_failover;
mod traits;

#[cfg(test)]
mod tests;

pub use dispatcher::{AsyncSmsDispatcher, DispatcherConfig};
pub use error_rate_failover::ErrorRateFailover;
pub use rate_limited::RateLimitedProvider;
pub use sequential::SequentialFailover;
pub use timeout_failover::TimeoutFailover;
pub use traits::{RateLimiter, SmsProvider};
