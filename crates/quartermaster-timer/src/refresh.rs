//! Proactive token refresh ahead of expiry.

use std::sync::Arc;
use std::time::Duration;

use quartermaster_gateway::{AuthGateway, RefreshError};
use quartermaster_token::Claims;

use crate::{TimerHandle, TimerKind};

/// Schedules one refresh call `buffer` before the token expires.
///
/// The scheduler only makes the call and reports the outcome. Deciding
/// whether the new token is acceptable, and re-arming for it, is the
/// coordinator's job. A failed refresh therefore leaves the scheduler
/// unarmed until someone calls [`arm`](Self::arm) again.
pub struct RefreshScheduler<A: AuthGateway> {
    gateway: Arc<A>,
    buffer: Duration,
    handle: Option<TimerHandle>,
    /// Unix time the pending refresh fires at.
    refresh_at: Option<Duration>,
}

impl<A: AuthGateway> RefreshScheduler<A> {
    /// Creates an unarmed scheduler that refreshes `buffer` before expiry.
    pub fn new(gateway: Arc<A>, buffer: Duration) -> Self {
        Self {
            gateway,
            buffer,
            handle: None,
            refresh_at: None,
        }
    }

    /// Cancels any pending refresh and schedules one for
    /// `claims.expires_at - buffer`.
    ///
    /// Returns `false` without arming when that instant is not after `now`:
    /// the token is too close to expiry to be worth refreshing and the
    /// expiry watchdog will end the session instead.
    ///
    /// `on_complete` receives the gateway's answer. It runs on the timer
    /// task, so it should hand the result off rather than do real work.
    pub fn arm<F>(
        &mut self,
        token: &str,
        claims: &Claims,
        now: Duration,
        on_complete: F,
    ) -> bool
    where
        F: FnOnce(Result<String, RefreshError>) + Send + 'static,
    {
        self.cancel();

        let refresh_at = claims.expiry().saturating_sub(self.buffer);
        if refresh_at <= now {
            tracing::debug!(
                expires_at = claims.expires_at,
                buffer_secs = self.buffer.as_secs(),
                "token too close to expiry, refresh not scheduled"
            );
            return false;
        }

        let delay = refresh_at - now;
        let gateway = Arc::clone(&self.gateway);
        let token = token.to_string();
        self.refresh_at = Some(refresh_at);
        self.handle = Some(TimerHandle::spawn(TimerKind::Refresh, async move {
            tokio::time::sleep(delay).await;
            tracing::debug!("refreshing token");
            let result = gateway.refresh(&token).await;
            on_complete(result);
        }));

        tracing::debug!(in_secs = delay.as_secs(), "token refresh scheduled");
        true
    }

    /// Cancels the pending refresh, aborting the request if it's in flight.
    pub fn cancel(&mut self) {
        self.refresh_at = None;
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
    }

    /// Whether a refresh is scheduled or in flight.
    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(TimerHandle::is_pending)
    }

    /// Unix time the pending refresh fires at.
    pub fn refresh_at(&self) -> Option<Duration> {
        self.refresh_at.filter(|_| self.is_armed())
    }

    /// How far ahead of expiry refreshes are scheduled.
    pub fn buffer(&self) -> Duration {
        self.buffer
    }
}

impl<A: AuthGateway> std::fmt::Debug for RefreshScheduler<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("buffer", &self.buffer)
            .field("refresh_at", &self.refresh_at)
            .field("armed", &self.is_armed())
            .finish()
    }
}
