//! Rate-limiting provider decorator
//!
//! Wraps any provider behind an admission check against the shared
//! limiter, so one key can cap the volume sent through a whole chain.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::errors::{DomainError, DomainResult};

use super::traits::{RateLimiter, SmsProvider};

/// Provider decorator that consults a rate limiter before delegating
pub struct RateLimitedProvider {
    inner: Arc<dyn SmsProvider>,
    limiter: Arc<dyn RateLimiter>,
    key: String,
}

impl RateLimitedProvider {
    /// Wrap `inner` behind the limiter under the given admission key
    pub fn new(inner: Arc<dyn SmsProvider>, limiter: Arc<dyn RateLimiter>, key: impl Into<String>) -> Self {
        Self {
            inner,
            limiter,
            key: key.into(),
        }
    }
}

#[async_trait]
impl SmsProvider for RateLimitedProvider {
    async fn send(
        &self,
        template_id: &str,
        args: &[String],
        recipients: &[String],
    ) -> DomainResult<()> {
        // A limiter error is a failed admission check, not "allowed"
        let limited = self.limiter.limit(&self.key).await?;
        if limited {
            warn!(key = %self.key, template_id, "send rejected by rate limiter");
            return Err(DomainError::RateLimited);
        }
        self.inner.send(template_id, args, recipients).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::delivery::tests::mocks::{MockRateLimiter, ScriptedProvider};

    fn recipients() -> Vec<String> {
        vec!["+15212341234".to_string()]
    }

    #[tokio::test]
    async fn delegates_when_admitted() {
        let inner = Arc::new(ScriptedProvider::succeeding("inner"));
        let provider = RateLimitedProvider::new(
            inner.clone(),
            Arc::new(MockRateLimiter::admitting()),
            "sms_limiter:test",
        );

        provider.send("tpl", &[], &recipients()).await.unwrap();
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn rejects_when_limited() {
        let inner = Arc::new(ScriptedProvider::succeeding("inner"));
        let provider = RateLimitedProvider::new(
            inner.clone(),
            Arc::new(MockRateLimiter::limiting()),
            "sms_limiter:test",
        );

        let err = provider.send("tpl", &[], &recipients()).await.unwrap_err();
        assert!(matches!(err, DomainError::RateLimited));
        assert_eq!(inner.calls(), 0);
    }

    #[tokio::test]
    async fn limiter_failure_propagates_without_sending() {
        let inner = Arc::new(ScriptedProvider::succeeding("inner"));
        let provider = RateLimitedProvider::new(
            inner.clone(),
            Arc::new(MockRateLimiter::unavailable()),
            "sms_limiter:test",
        );

        let err = provider.send("tpl", &[], &recipients()).await.unwrap_err();
        assert!(matches!(err, DomainError::StoreUnavailable { .. }));
        assert_eq!(inner.calls(), 0);
    }
}
