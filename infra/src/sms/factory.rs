//! Delivery assembly from configuration
//!
//! Builds the configured failover chain over a set of providers and
//! wires it into a dispatcher together with the retry queue and the
//! rate limiter.

use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use tracing::info;

use relay_core::repositories::MessageQueueRepository;
use relay_core::services::delivery::{
    AsyncSmsDispatcher, DispatcherConfig, ErrorRateFailover, RateLimiter, SequentialFailover,
    SmsProvider, TimeoutFailover,
};
use relay_shared::config::delivery::DeliveryConfig;

use crate::InfrastructureError;

/// Compose providers behind the failover strategy named in `config`
///
/// Recognized strategies: `sequential`, `timeout`, `error-rate`.
pub fn build_failover_chain(
    providers: Vec<Arc<dyn SmsProvider>>,
    config: &DeliveryConfig,
) -> Result<Arc<dyn SmsProvider>, InfrastructureError> {
    if providers.is_empty() {
        return Err(InfrastructureError::Config(
            "failover chain needs at least one provider".to_string(),
        ));
    }

    info!(strategy = %config.strategy, providers = providers.len(), "assembling failover chain");

    let chain: Arc<dyn SmsProvider> = match config.strategy.as_str() {
        "sequential" => Arc::new(SequentialFailover::new(providers)),
        "timeout" => Arc::new(TimeoutFailover::new(
            providers,
            config.timeout_rotation_threshold,
        )),
        "error-rate" => Arc::new(ErrorRateFailover::new(
            providers,
            config.error_rate_threshold,
            ChronoDuration::seconds(config.error_rate_window_seconds as i64),
        )),
        other => {
            return Err(InfrastructureError::Config(format!(
                "unknown failover strategy: {}",
                other
            )))
        }
    };

    Ok(chain)
}

/// Wire a failover chain, queue, and limiter into a running dispatcher
///
/// Must be called from within a tokio runtime; the dispatcher spawns its
/// queue consumer on creation.
pub fn create_dispatcher(
    chain: Arc<dyn SmsProvider>,
    queue: Arc<dyn MessageQueueRepository>,
    limiter: Arc<dyn RateLimiter>,
    config: &DeliveryConfig,
) -> AsyncSmsDispatcher {
    AsyncSmsDispatcher::new(chain, queue, limiter, DispatcherConfig::from(config))
}
