//! Rolling inactivity deadline.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};

use crate::{TimerHandle, TimerKind};

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Single-shot idle timer that every activity signal pushes back.
///
/// The callback is kept between re-arms so [`touch`](Self::touch) can
/// restart the countdown without the caller supplying it again.
pub struct IdleTimeoutScheduler {
    timeout: Duration,
    on_timeout: Option<Callback>,
    handle: Option<TimerHandle>,
    deadline: Option<Instant>,
}

impl IdleTimeoutScheduler {
    /// Creates an unarmed scheduler.
    pub fn new() -> Self {
        Self {
            timeout: Duration::ZERO,
            on_timeout: None,
            handle: None,
            deadline: None,
        }
    }

    /// Cancels any pending countdown and starts a new one of `timeout`.
    pub fn arm<F>(&mut self, timeout: Duration, on_timeout: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.timeout = timeout;
        self.on_timeout = Some(Arc::new(on_timeout));
        self.restart(Instant::now());
    }

    /// Restarts the countdown with the timeout and callback from the last
    /// [`arm`](Self::arm). Returns `false` (and does nothing) if the
    /// scheduler isn't armed.
    pub fn touch(&mut self) -> bool {
        self.touch_from(Instant::now())
    }

    /// Like [`touch`](Self::touch), but the new deadline is `from` plus
    /// the timeout. A `from` in the past shortens the countdown.
    pub fn touch_from(&mut self, from: Instant) -> bool {
        if self.on_timeout.is_none() {
            return false;
        }
        self.restart(from);
        true
    }

    /// Stops the countdown and forgets the callback. No-op when unarmed.
    pub fn cancel(&mut self) {
        self.on_timeout = None;
        self.deadline = None;
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
    }

    /// Whether a countdown is running.
    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(TimerHandle::is_pending)
    }

    /// When the current countdown ends.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline.filter(|_| self.is_armed())
    }

    fn restart(&mut self, from: Instant) {
        let Some(on_timeout) = self.on_timeout.clone() else {
            return;
        };
        if let Some(previous) = self.handle.take() {
            previous.cancel();
        }
        let deadline = from + self.timeout;
        self.deadline = Some(deadline);
        self.handle = Some(TimerHandle::spawn(TimerKind::Idle, async move {
            sleep_until(deadline).await;
            tracing::debug!("idle deadline reached");
            on_timeout();
        }));
    }
}

impl Default for IdleTimeoutScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IdleTimeoutScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdleTimeoutScheduler")
            .field("timeout", &self.timeout)
            .field("armed", &self.is_armed())
            .field("deadline", &self.deadline)
            .finish()
    }
}
