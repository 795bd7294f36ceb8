//! Verification code configuration module

use serde::{Deserialize, Serialize};

/// Configuration for one-time verification codes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerificationConfig {
    /// Seconds a stored code stays valid
    pub code_ttl_seconds: u64,

    /// Seconds a caller must wait before a code may be reissued
    pub resend_cooldown_seconds: u64,

    /// Maximum number of verification attempts per code
    pub max_attempts: u32,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            code_ttl_seconds: 600,
            resend_cooldown_seconds: 60,
            max_attempts: 3,
        }
    }
}

impl VerificationConfig {
    /// Remaining TTL above which a resend request is still inside the
    /// cooldown and must be rejected
    pub fn resend_threshold_seconds(&self) -> u64 {
        self.code_ttl_seconds.saturating_sub(self.resend_cooldown_seconds)
    }
}
