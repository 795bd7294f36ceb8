//! Console SMS provider for development and testing
//!
//! Logs messages instead of sending them. Supports simulated failures
//! and artificial latency so failover rotation and the dispatcher's
//! slow-path accounting can be exercised without a real provider.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use relay_core::services::delivery::SmsProvider;
use relay_core::{DomainError, DomainResult};

/// Provider that logs every message to the console
#[derive(Clone)]
pub struct ConsoleSmsProvider {
    /// Provider name reported to failover strategies
    name: String,
    /// Counter for tracking number of messages sent
    message_count: Arc<AtomicU64>,
    /// Whether to simulate failures
    simulate_failure: bool,
    /// Artificial delay before each send completes
    latency: Option<Duration>,
}

impl ConsoleSmsProvider {
    /// Create a new console provider
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message_count: Arc::new(AtomicU64::new(0)),
            simulate_failure: false,
            latency: None,
        }
    }

    /// Create a provider with configurable failure and latency behavior
    pub fn with_options(
        name: impl Into<String>,
        simulate_failure: bool,
        latency: Option<Duration>,
    ) -> Self {
        Self {
            name: name.into(),
            message_count: Arc::new(AtomicU64::new(0)),
            simulate_failure,
            latency,
        }
    }

    /// Total number of messages sent
    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SmsProvider for ConsoleSmsProvider {
    async fn send(
        &self,
        template_id: &str,
        args: &[String],
        recipients: &[String],
    ) -> DomainResult<()> {
        if let Some(delay) = self.latency {
            tokio::time::sleep(delay).await;
        }

        if self.simulate_failure {
            warn!(provider = %self.name, "simulating delivery failure");
            return Err(DomainError::Provider {
                message: format!("{}: simulated delivery failure", self.name),
            });
        }

        let message_id = format!("console_{}", Uuid::new_v4());
        let count = self.message_count.fetch_add(1, Ordering::SeqCst) + 1;

        for recipient in recipients {
            info!(
                provider = %self.name,
                phone = %mask_phone(recipient),
                template_id,
                args = ?args,
                message_id = %message_id,
                count,
                "SMS delivered (console)"
            );
        }

        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Mask a phone number for logging (show only the last 4 digits)
fn mask_phone(phone: &str) -> String {
    if phone.len() <= 4 {
        "****".to_string()
    } else {
        format!("***{}", &phone[phone.len() - 4..])
    }
}
