//! Redis-backed cache implementations
//!
//! Everything in this module that makes a decision does so inside a
//! single Lua script: the store is shared between instances, so
//! get-then-set sequences on the client are disallowed.

pub mod code_cache;
pub mod rate_limiter;
pub mod redis_client;

pub use code_cache::RedisCodeCache;
pub use rate_limiter::RedisSlidingWindowLimiter;
pub use redis_client::RedisClient;

// Re-export commonly used types
pub use relay_shared::config::cache::CacheConfig;
