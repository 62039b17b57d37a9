//! Hard-expiry fallback.

use std::time::Duration;

use quartermaster_token::Claims;

use crate::{TimerHandle, TimerKind};

/// Fires exactly at `claims.expires_at`, whatever happened to the refresh.
#[derive(Debug, Default)]
pub struct ExpiryWatchdog {
    handle: Option<TimerHandle>,
    expires_at: Option<Duration>,
}

impl ExpiryWatchdog {
    /// Creates an unarmed watchdog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the previous watchdog and arms one for `claims.expires_at`.
    /// A token that is already past expiry fires on the next runtime turn.
    pub fn arm<F>(&mut self, claims: &Claims, now: Duration, on_expire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        let delay = claims.remaining(now);
        self.expires_at = Some(claims.expiry());
        self.handle = Some(TimerHandle::spawn(TimerKind::Expiry, async move {
            tokio::time::sleep(delay).await;
            tracing::debug!("token expiry reached");
            on_expire();
        }));
    }

    /// Disarms the watchdog. No-op when unarmed.
    pub fn cancel(&mut self) {
        self.expires_at = None;
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
    }

    /// Whether the watchdog is waiting to fire.
    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(TimerHandle::is_pending)
    }

    /// Unix time the watchdog fires at.
    pub fn expires_at(&self) -> Option<Duration> {
        self.expires_at.filter(|_| self.is_armed())
    }
}
