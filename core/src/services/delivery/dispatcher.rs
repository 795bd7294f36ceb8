//! Adaptive sync/async SMS dispatcher
//!
//! Routes each send either straight through the provider chain or into a
//! persisted retry queue, based on recent latency and the shared rate
//! limiter. A background consumer drains the queue: it claims one waiting
//! message at a time, delivers it under a bounded deadline, and reports
//! the outcome back to the queue. The consumer runs behind a supervisor
//! that restarts it if it faults, and stops on the shutdown signal the
//! dispatcher owns.

use rand::Rng;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use relay_shared::config::delivery::DeliveryConfig;

use crate::domain::entities::pending_message::PendingMessage;
use crate::errors::DomainResult;
use crate::repositories::message_queue::MessageQueueRepository;

use super::traits::{RateLimiter, SmsProvider};

/// Tuning knobs for the dispatcher
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Consecutive slow responses before async routing is preferred
    pub slow_response_threshold: u32,
    /// Latency at or above which a synchronous send counts as slow
    pub slow_response_latency: Duration,
    /// Retry budget stamped onto queued messages
    pub retry_max: u32,
    /// Deadline for one claim attempt against the queue
    pub claim_timeout: Duration,
    /// Deadline for one provider call made by the consumer
    pub attempt_timeout: Duration,
    /// How long the consumer sleeps when the queue is empty
    pub idle_sleep: Duration,
    /// Limiter key consulted by the routing decision
    pub limiter_key: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            slow_response_threshold: 10,
            slow_response_latency: Duration::from_secs(1),
            retry_max: 3,
            claim_timeout: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(1),
            idle_sleep: Duration::from_secs(1),
            limiter_key: "sms_dispatch".to_string(),
        }
    }
}

impl From<&DeliveryConfig> for DispatcherConfig {
    fn from(config: &DeliveryConfig) -> Self {
        Self {
            slow_response_threshold: config.slow_response_threshold,
            slow_response_latency: Duration::from_millis(config.slow_response_millis),
            retry_max: config.retry_max,
            attempt_timeout: Duration::from_secs(config.attempt_timeout_seconds),
            ..Self::default()
        }
    }
}

/// Share of sends routed synchronously as a recovery probe once the
/// slow-response threshold has been reached
const RECOVERY_PROBE_PERCENT: u32 = 10;

/// Dispatcher that adapts between synchronous and queued delivery
pub struct AsyncSmsDispatcher {
    provider: Arc<dyn SmsProvider>,
    queue: Arc<dyn MessageQueueRepository>,
    limiter: Arc<dyn RateLimiter>,
    config: DispatcherConfig,
    /// Consecutive synchronous sends that breached the latency bar
    slow_count: Arc<AtomicU32>,
    shutdown: watch::Sender<bool>,
}

impl AsyncSmsDispatcher {
    /// Create a dispatcher and start its background consumer
    ///
    /// Must be called from within a tokio runtime; the consumer task is
    /// spawned here and runs until `shutdown` (or drop).
    ///
    /// # Arguments
    ///
    /// * `provider` - The failover chain used for actual delivery
    /// * `queue` - Persisted retry queue
    /// * `limiter` - Shared admission-control limiter
    /// * `config` - Dispatcher tuning
    pub fn new(
        provider: Arc<dyn SmsProvider>,
        queue: Arc<dyn MessageQueueRepository>,
        limiter: Arc<dyn RateLimiter>,
        config: DispatcherConfig,
    ) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let dispatcher = Self {
            provider,
            queue,
            limiter,
            config,
            slow_count: Arc::new(AtomicU32::new(0)),
            shutdown,
        };
        dispatcher.spawn_consumer(shutdown_rx);
        dispatcher
    }

    /// Send a templated message, choosing the route per call
    ///
    /// The asynchronous route persists the message and returns
    /// immediately; its only error is a persistence failure. The
    /// synchronous route returns the provider chain's outcome.
    pub async fn send(
        &self,
        template_id: &str,
        args: &[String],
        recipients: &[String],
    ) -> DomainResult<()> {
        if self.need_async().await {
            let message = PendingMessage::new(
                template_id,
                args.to_vec(),
                recipients.to_vec(),
                self.config.retry_max,
            );
            let id = self.queue.insert(message).await?;
            debug!(id, template_id, "message queued for asynchronous delivery");
            return Ok(());
        }

        let start = Instant::now();
        let result = self.provider.send(template_id, args, recipients).await;
        let elapsed = start.elapsed();

        if elapsed >= self.config.slow_response_latency {
            let count = self.slow_count.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(
                elapsed_ms = elapsed.as_millis() as u64,
                consecutive_slow = count,
                "slow synchronous send"
            );
        } else if result.is_ok() {
            self.slow_count.store(0, Ordering::SeqCst);
        }
        result
    }

    /// Current consecutive slow-response count
    pub fn slow_count(&self) -> u32 {
        self.slow_count.load(Ordering::SeqCst)
    }

    /// Stop the background consumer
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Decide whether this call is routed asynchronously
    ///
    /// Once the slow counter has reached its threshold, roughly 90% of
    /// calls go async and 10% stay synchronous as recovery probes. Below
    /// the threshold the limiter decides; a limiter failure counts as a
    /// failed admission check and routes async.
    async fn need_async(&self) -> bool {
        if self.slow_count.load(Ordering::SeqCst) >= self.config.slow_response_threshold {
            let draw = rand::thread_rng().gen_range(0..100);
            return draw >= RECOVERY_PROBE_PERCENT;
        }

        match self.limiter.limit(&self.config.limiter_key).await {
            Ok(limited) => {
                if limited {
                    warn!(key = %self.config.limiter_key, "rate limiter triggered, routing async");
                }
                limited
            }
            Err(err) => {
                error!(error = %err, "rate limiter unavailable, treating send as limited");
                true
            }
        }
    }

    /// Spawn the consumer behind a supervisor that restarts it when the
    /// task faults instead of exiting through the shutdown signal
    fn spawn_consumer(&self, shutdown_rx: watch::Receiver<bool>) {
        let provider = Arc::clone(&self.provider);
        let queue = Arc::clone(&self.queue);
        let config = self.config.clone();
        tokio::spawn(async move {
            loop {
                let handle = tokio::spawn(consume_loop(
                    Arc::clone(&provider),
                    Arc::clone(&queue),
                    config.clone(),
                    shutdown_rx.clone(),
                ));
                match handle.await {
                    Ok(()) => break,
                    Err(err) => {
                        error!(error = %err, "queue consumer faulted, restarting");
                    }
                }
            }
        });
    }
}

impl Drop for AsyncSmsDispatcher {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

/// Drain the retry queue until the shutdown signal fires
async fn consume_loop(
    provider: Arc<dyn SmsProvider>,
    queue: Arc<dyn MessageQueueRepository>,
    config: DispatcherConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("queue consumer started");
    loop {
        if *shutdown.borrow() {
            info!("queue consumer stopping");
            return;
        }

        match tokio::time::timeout(config.claim_timeout, queue.claim_next()).await {
            Ok(Ok(Some(message))) => {
                // The claim transaction is already committed; the
                // provider call happens with no store lock held. Shutdown
                // aborts the attempt rather than waiting it out; the
                // claimed message stays reclaimable once its lease ends.
                tokio::select! {
                    () = deliver(&*provider, &*queue, &config, message) => {}
                    _ = shutdown.changed() => {
                        info!("queue consumer stopping mid-delivery");
                        return;
                    }
                }
            }
            Ok(Ok(None)) => {
                // Normal idle state
                idle(&config, &mut shutdown).await;
            }
            Ok(Err(err)) => {
                error!(error = %err, "failed to claim from retry queue");
                idle(&config, &mut shutdown).await;
            }
            Err(_) => {
                warn!("claim attempt exceeded its deadline");
                idle(&config, &mut shutdown).await;
            }
        }
    }
}

/// Sleep out the idle interval, waking early on shutdown
async fn idle(config: &DispatcherConfig, shutdown: &mut watch::Receiver<bool>) {
    tokio::select! {
        _ = tokio::time::sleep(config.idle_sleep) => {}
        _ = shutdown.changed() => {}
    }
}

/// Deliver one claimed message and report the outcome to the queue
async fn deliver(
    provider: &dyn SmsProvider,
    queue: &dyn MessageQueueRepository,
    config: &DispatcherConfig,
    message: PendingMessage,
) {
    let outcome = tokio::time::timeout(
        config.attempt_timeout,
        provider.send(&message.template_id, &message.args, &message.recipients),
    )
    .await;

    match outcome {
        Ok(Ok(())) => {
            if let Err(err) = queue.mark_success(message.id).await {
                error!(id = message.id, error = %err, "failed to record delivery success");
            }
        }
        Ok(Err(err)) => {
            warn!(
                id = message.id,
                retry_count = message.retry_count,
                error = %err,
                "queued delivery attempt failed"
            );
            fail_or_requeue(queue, &message).await;
        }
        Err(_) => {
            warn!(
                id = message.id,
                retry_count = message.retry_count,
                "queued delivery attempt timed out"
            );
            fail_or_requeue(queue, &message).await;
        }
    }
}

/// Mark the message failed once its retry budget is spent; otherwise
/// leave it waiting for a later claim
async fn fail_or_requeue(queue: &dyn MessageQueueRepository, message: &PendingMessage) {
    if message.retries_exhausted() {
        if let Err(err) = queue.mark_failed(message.id).await {
            error!(id = message.id, error = %err, "failed to record delivery failure");
        }
    }
}
