//! # Relay Core
//!
//! Core delivery-resilience logic for the Relay SMS backend.
//! This crate contains domain entities, the provider failover strategies,
//! the adaptive sync/async dispatcher, the one-time-code issuance service,
//! repository interfaces, and error types.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
