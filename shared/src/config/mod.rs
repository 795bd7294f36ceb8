//! Configuration modules for the Relay workspace

pub mod cache;
pub mod delivery;
pub mod rate_limit;
pub mod verification;

pub use cache::CacheConfig;
pub use delivery::DeliveryConfig;
pub use rate_limit::RateLimitConfig;
pub use verification::VerificationConfig;
