//! Sequential provider failover
//!
//! Tries every provider in fixed order on every call and returns on the
//! first success. There is no rotation state; each call is its own
//! fallback chain starting from the first provider.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::errors::{DomainError, DomainResult};

use super::traits::SmsProvider;

/// Per-call fallback chain over an ordered provider list
pub struct SequentialFailover {
    providers: Vec<Arc<dyn SmsProvider>>,
}

impl SequentialFailover {
    /// Create a sequential chain over the given providers
    pub fn new(providers: Vec<Arc<dyn SmsProvider>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl SmsProvider for SequentialFailover {
    async fn send(
        &self,
        template_id: &str,
        args: &[String],
        recipients: &[String],
    ) -> DomainResult<()> {
        for provider in &self.providers {
            match provider.send(template_id, args, recipients).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    warn!(
                        provider = provider.name(),
                        template_id,
                        error = %err,
                        "provider failed, falling through to next"
                    );
                }
            }
        }
        Err(DomainError::AllProvidersFailed {
            providers: self.providers.len(),
        })
    }

    fn name(&self) -> &str {
        "sequential-failover"
    }
}
