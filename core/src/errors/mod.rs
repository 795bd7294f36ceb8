//! Domain-specific error types and error handling.

use thiserror::Error;

/// Core domain errors for the delivery-resilience layer
#[derive(Error, Debug)]
pub enum DomainError {
    /// The shared key-value store or the message queue could not be
    /// reached. Callers must treat this as a failed admission check,
    /// never as "allowed".
    #[error("store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// A code was requested again while the previous one is still inside
    /// its resend cooldown
    #[error("verification code sent too frequently")]
    TooManySends,

    /// The verify-attempt cap for the current code has been exhausted
    #[error("too many verification attempts")]
    TooManyVerifyAttempts,

    /// A stored code entry has no expiration. This state should never
    /// occur and is never repaired automatically.
    #[error("verification code entry for {key} has no expiration")]
    CodeIntegrity { key: String },

    /// Every provider in a failover chain rejected the message
    #[error("all {providers} SMS providers failed")]
    AllProvidersFailed { providers: usize },

    /// A provider call exceeded its deadline. Only this class of error
    /// drives timeout-based failover rotation.
    #[error("SMS provider timed out")]
    SendTimeout,

    /// A provider rejected the message for a reason other than a timeout
    #[error("SMS provider error: {message}")]
    Provider { message: String },

    /// The admission-control limiter rejected the event
    #[error("rate limit triggered")]
    RateLimited,

    /// Internal error
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    /// Whether this error counts as a timeout for failover accounting
    pub fn is_timeout(&self) -> bool {
        matches!(self, DomainError::SendTimeout)
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_send_timeout_classifies_as_timeout() {
        assert!(DomainError::SendTimeout.is_timeout());
        assert!(!DomainError::RateLimited.is_timeout());
        assert!(!DomainError::Provider {
            message: "rejected".to_string()
        }
        .is_timeout());
    }

    #[test]
    fn errors_render_for_logs() {
        let err = DomainError::AllProvidersFailed { providers: 3 };
        assert_eq!(err.to_string(), "all 3 SMS providers failed");

        let err = DomainError::CodeIntegrity {
            key: "phone_code:login:***1234".to_string(),
        };
        assert!(err.to_string().contains("no expiration"));
    }
}
