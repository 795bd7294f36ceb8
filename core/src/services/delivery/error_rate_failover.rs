//! Error-rate-windowed provider failover
//!
//! Tracks request and error timestamps inside a trailing window and
//! rotates the active provider once the observed error rate crosses a
//! threshold. A background sweep evicts expired entries once a second,
//! independently of the request path, and stops on the shutdown signal
//! owned by the instance.
//!
//! The window accounting is a heuristic: concurrent callers may observe
//! slightly stale counts or a freshly rotated index. Rotation is a
//! liveness optimization, not a correctness guarantee.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{error, info};

use crate::errors::DomainResult;

use super::traits::SmsProvider;

/// Trailing event logs shared between the request path and the sweep
struct WindowLogs {
    requests: Mutex<VecDeque<DateTime<Utc>>>,
    errors: Mutex<VecDeque<DateTime<Utc>>>,
}

impl WindowLogs {
    fn new() -> Self {
        Self {
            requests: Mutex::new(VecDeque::new()),
            errors: Mutex::new(VecDeque::new()),
        }
    }

    /// errors / requests within the window; 0 when there are no requests
    fn error_rate(&self) -> f64 {
        let requests = self.requests.lock().unwrap().len();
        if requests == 0 {
            return 0.0;
        }
        let errors = self.errors.lock().unwrap().len();
        errors as f64 / requests as f64
    }

    fn record(&self, at: DateTime<Utc>, is_error: bool) {
        if is_error {
            self.errors.lock().unwrap().push_back(at);
        }
        self.requests.lock().unwrap().push_back(at);
    }

    /// Drop entries older than `cutoff` from both logs
    fn prune(&self, cutoff: DateTime<Utc>) {
        for log in [&self.requests, &self.errors] {
            let mut log = log.lock().unwrap();
            while log.front().is_some_and(|t| *t < cutoff) {
                log.pop_front();
            }
        }
    }

    fn clear(&self) {
        self.requests.lock().unwrap().clear();
        self.errors.lock().unwrap().clear();
    }
}

/// Rotating failover driven by the trailing-window error rate
pub struct ErrorRateFailover {
    providers: Vec<Arc<dyn SmsProvider>>,
    /// Active provider index; the chain cycles, no terminal state
    idx: AtomicUsize,
    threshold: f64,
    window: Duration,
    logs: Arc<WindowLogs>,
    shutdown: watch::Sender<bool>,
}

impl ErrorRateFailover {
    /// Create an error-rate failover chain and start its sweep task
    ///
    /// # Arguments
    ///
    /// * `providers` - Ordered provider list; rotation wraps around
    /// * `threshold` - Error rate (0.0 - 1.0) above which the chain rotates
    /// * `window` - Trailing window for the rate accounting
    ///
    /// Must be called from within a tokio runtime; the sweep task is
    /// spawned here and runs until `shutdown` (or drop).
    pub fn new(providers: Vec<Arc<dyn SmsProvider>>, threshold: f64, window: Duration) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let service = Self {
            providers,
            idx: AtomicUsize::new(0),
            threshold,
            window,
            logs: Arc::new(WindowLogs::new()),
            shutdown,
        };
        service.spawn_sweep(shutdown_rx);
        service
    }

    /// Index of the provider the next call will use
    pub fn current_index(&self) -> usize {
        self.idx.load(Ordering::SeqCst)
    }

    /// Stop the background sweep
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Spawn the sweep behind a small supervisor that restarts it if the
    /// task faults instead of exiting through the shutdown signal
    fn spawn_sweep(&self, shutdown_rx: watch::Receiver<bool>) {
        let logs = Arc::clone(&self.logs);
        let window = self.window;
        tokio::spawn(async move {
            loop {
                let task_logs = Arc::clone(&logs);
                let task_rx = shutdown_rx.clone();
                let handle = tokio::spawn(sweep_loop(task_logs, window, task_rx));
                match handle.await {
                    Ok(()) => break,
                    Err(err) => {
                        error!(error = %err, "window sweep task faulted, restarting");
                    }
                }
            }
        });
    }
}

/// Evict expired entries from both logs once a second until shutdown
async fn sweep_loop(logs: Arc<WindowLogs>, window: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                logs.prune(Utc::now() - window);
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
        }
    }
}

impl Drop for ErrorRateFailover {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

#[async_trait]
impl SmsProvider for ErrorRateFailover {
    async fn send(
        &self,
        template_id: &str,
        args: &[String],
        recipients: &[String],
    ) -> DomainResult<()> {
        let idx = self.idx.load(Ordering::SeqCst);
        if self.logs.error_rate() > self.threshold {
            let new_idx = (idx + 1) % self.providers.len();
            // One rotation per crossing; the winner starts the next
            // window from empty logs.
            if self
                .idx
                .compare_exchange(idx, new_idx, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                self.logs.clear();
                info!(
                    from = self.providers[idx].name(),
                    to = self.providers[new_idx].name(),
                    threshold = self.threshold,
                    "rotating provider after error rate crossed threshold"
                );
            }
        }

        let idx = self.idx.load(Ordering::SeqCst);
        let result = self.providers[idx]
            .send(template_id, args, recipients)
            .await;
        self.logs.record(Utc::now(), result.is_err());
        result
    }

    fn name(&self) -> &str {
        "error-rate-failover"
    }
}
