//! Traits for SMS provider and rate limiter integration

use async_trait::async_trait;

use crate::errors::DomainResult;

/// Capability to deliver a templated SMS to a set of recipients
///
/// Concrete third-party providers, the failover strategies, and the
/// dispatcher all expose this same surface, so policies compose freely.
#[async_trait]
pub trait SmsProvider: Send + Sync {
    /// Send a templated message to the given recipients
    ///
    /// # Arguments
    ///
    /// * `template_id` - Provider template identifier
    /// * `args` - Template arguments, in template order
    /// * `recipients` - Recipient phone numbers
    async fn send(
        &self,
        template_id: &str,
        args: &[String],
        recipients: &[String],
    ) -> DomainResult<()>;

    /// Name of the provider, for logs
    fn name(&self) -> &str;
}

/// Admission-control primitive over a trailing time window
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Decide whether a new event for `key` is admitted
    ///
    /// Returns `Ok(true)` when the event is limited (rejected). The check
    /// and the event recording happen as one atomic step in the store. A
    /// store error means the admission check failed; callers must not
    /// treat it as "allowed".
    async fn limit(&self, key: &str) -> DomainResult<bool>;
}
