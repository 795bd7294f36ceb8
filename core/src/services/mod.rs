//! Business services containing domain logic and use cases.

pub mod delivery;
pub mod verification;

// Re-export commonly used types
pub use delivery::{
    AsyncSmsDispatcher, ErrorRateFailover, RateLimitedProvider, RateLimiter, SequentialFailover,
    SmsProvider, TimeoutFailover,
};
pub use verification::{CodeCache, CodeService, CodeServiceConfig};
