//! Periodic account-status revalidation.

use std::sync::Arc;
use std::time::Duration;

use quartermaster_gateway::AccountStatusGateway;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::{TimerHandle, TimerKind};

/// Polls the status endpoint: once after `initial_delay`, then every
/// `interval`.
///
/// Fail-open: a check that errors counts as "still active". Only an
/// explicit `active: false` stops the poller and fires the callback.
pub struct StatusPoller<P: AccountStatusGateway> {
    gateway: Arc<P>,
    initial_delay: Duration,
    interval: Duration,
    handle: Option<TimerHandle>,
}

impl<P: AccountStatusGateway> StatusPoller<P> {
    /// Creates an unarmed poller.
    ///
    /// # Panics
    /// [`arm`](Self::arm) panics if `interval` is zero (a Tokio interval
    /// restriction). `SessionConfig::validated` never produces one.
    pub fn new(gateway: Arc<P>, initial_delay: Duration, interval: Duration) -> Self {
        Self {
            gateway,
            initial_delay,
            interval,
            handle: None,
        }
    }

    /// Cancels any running poll loop and starts a new one for `token`.
    ///
    /// `on_deactivated` runs at most once, after which the loop ends.
    pub fn arm<F>(&mut self, token: &str, on_deactivated: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        let gateway = Arc::clone(&self.gateway);
        let token = token.to_string();
        let start = Instant::now() + self.initial_delay;
        let period = self.interval;

        self.handle = Some(TimerHandle::spawn(TimerKind::StatusPoll, async move {
            let mut ticker = interval_at(start, period);
            // A slow check shouldn't trigger a burst of catch-up checks.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match gateway.check_status(&token).await {
                    Ok(status) if !status.active => {
                        tracing::info!("account reported inactive");
                        on_deactivated();
                        return;
                    }
                    Ok(_) => tracing::trace!("account still active"),
                    Err(e) => {
                        tracing::warn!(error = %e, "status check failed, assuming active");
                    }
                }
            }
        }));
    }

    /// Stops both the initial delay and the interval.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
    }

    /// Whether the poll loop is running.
    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(TimerHandle::is_pending)
    }
}

impl<P: AccountStatusGateway> std::fmt::Debug for StatusPoller<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusPoller")
            .field("initial_delay", &self.initial_delay)
            .field("interval", &self.interval)
            .field("armed", &self.is_armed())
            .finish()
    }
}
