//! Shared configuration types for the Relay delivery core
//!
//! This crate provides the configuration structures used across the
//! workspace:
//! - Redis cache connection settings
//! - Sliding-window rate limit settings
//! - Verification code settings (TTL, cooldown, attempt cap)
//! - Delivery (failover + async dispatch) settings

pub mod config;

// Re-export commonly used items at crate root
pub use config::{CacheConfig, DeliveryConfig, RateLimitConfig, VerificationConfig};
