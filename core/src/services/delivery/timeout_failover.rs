//! Timeout-count provider failover
//!
//! Keeps a shared active-provider index and a consecutive-timeout
//! counter. Once the counter reaches its threshold, the index rotates to
//! the next provider through a compare-and-swap, so exactly one racing
//! caller performs the rotation per threshold crossing. Only
//! timeout-classified errors drive the counter; other provider errors
//! leave both index and counter untouched.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::errors::DomainResult;

use super::traits::SmsProvider;

/// Rotating failover driven by consecutive provider timeouts
pub struct TimeoutFailover {
    providers: Vec<Arc<dyn SmsProvider>>,
    /// Active provider index; the chain cycles, no terminal state
    idx: AtomicUsize,
    /// Consecutive timeouts observed on the active provider
    timeout_count: AtomicU32,
    threshold: u32,
}

impl TimeoutFailover {
    /// Create a timeout-count failover chain
    ///
    /// # Arguments
    ///
    /// * `providers` - Ordered provider list; rotation wraps around
    /// * `threshold` - Consecutive timeouts that trigger one rotation
    pub fn new(providers: Vec<Arc<dyn SmsProvider>>, threshold: u32) -> Self {
        Self {
            providers,
            idx: AtomicUsize::new(0),
            timeout_count: AtomicU32::new(0),
            threshold,
        }
    }

    /// Index of the provider the next call will use
    pub fn current_index(&self) -> usize {
        self.idx.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SmsProvider for TimeoutFailover {
    async fn send(
        &self,
        template_id: &str,
        args: &[String],
        recipients: &[String],
    ) -> DomainResult<()> {
        let idx = self.idx.load(Ordering::SeqCst);
        let count = self.timeout_count.load(Ordering::SeqCst);

        if count >= self.threshold {
            // Zeroing the counter elects the sole rotator: exactly one
            // caller wins the swap per threshold crossing, the rest
            // proceed with whichever index results.
            if self
                .timeout_count
                .compare_exchange(count, 0, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                let new_idx = (idx + 1) % self.providers.len();
                self.idx.store(new_idx, Ordering::SeqCst);
                info!(
                    from = self.providers[idx].name(),
                    to = self.providers[new_idx].name(),
                    "rotating provider after repeated timeouts"
                );
            }
        }
        let idx = self.idx.load(Ordering::SeqCst);

        let provider = &self.providers[idx];
        match provider.send(template_id, args, recipients).await {
            Ok(()) => {
                self.timeout_count.store(0, Ordering::SeqCst);
                Ok(())
            }
            Err(err) if err.is_timeout() => {
                self.timeout_count.fetch_add(1, Ordering::SeqCst);
                Err(err)
            }
            // Non-timeout failures do not touch the rotation state
            Err(err) => Err(err),
        }
    }

    fn name(&self) -> &str {
        "timeout-failover"
    }
}
