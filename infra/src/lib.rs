//! # Relay Infrastructure
//!
//! Concrete implementations behind the core delivery interfaces:
//!
//! - **Cache**: Redis-backed code cache and sliding-window rate limiter,
//!   both built on single atomic Lua scripts
//! - **Database**: MySQL retry-queue repository using SQLx
//! - **SMS**: provider implementations and the factory that assembles a
//!   failover chain plus dispatcher from configuration

/// Cache module - Redis client and the atomic cache scripts
pub mod cache;

/// Database module - MySQL implementations using SQLx
pub mod database;

/// SMS module - provider implementations and delivery assembly
pub mod sms;

use relay_core::DomainError;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// SMS service error
    #[error("SMS service error: {0}")]
    Sms(String),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(String),
}

/// Infrastructure failures reach the domain as store unavailability;
/// the caller treats the backing service as down, whatever the cause.
impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        DomainError::StoreUnavailable {
            message: err.to_string(),
        }
    }
}
