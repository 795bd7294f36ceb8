//! Verification code issuance for SMS login
//!
//! This module provides the one-time-code workflow:
//! - Code generation and delivery through an `SmsProvider`
//! - Atomic storage with a resend cooldown
//! - Verification with a per-code attempt cap

mod config;
mod service;
mod traits;

#[cfg(test)]
mod tests;

pub use config::CodeServiceConfig;
pub use service::CodeService;
pub use traits::CodeCache;
