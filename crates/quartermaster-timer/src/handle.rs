//! Owned handles to running timer tasks.

use std::fmt;
use std::future::Future;

use tokio::task::JoinHandle;

/// The four session timers. Each scheduler owns at most one live handle
/// of its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Rolling inactivity deadline.
    Idle,
    /// Proactive token refresh ahead of expiry.
    Refresh,
    /// Hard expiry at the token's `exp`.
    Expiry,
    /// Periodic account-status revalidation.
    StatusPoll,
}

impl TimerKind {
    /// Every kind, in arming order.
    pub const ALL: [Self; 4] = [Self::Idle, Self::Refresh, Self::Expiry, Self::StatusPoll];
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Refresh => write!(f, "refresh"),
            Self::Expiry => write!(f, "expiry"),
            Self::StatusPoll => write!(f, "status-poll"),
        }
    }
}

/// A spawned timer task.
///
/// Cancelling aborts the task. So does dropping the handle: there is no
/// way to lose track of a running timer and leave it firing in the
/// background.
#[derive(Debug)]
pub struct TimerHandle {
    kind: TimerKind,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Spawns `timer` onto the current Tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime, like `tokio::spawn`.
    pub fn spawn<F>(kind: TimerKind, timer: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            kind,
            task: tokio::spawn(timer),
        }
    }

    /// Which timer this is.
    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    /// `true` until the timer has fired (or been aborted) and its task has
    /// finished.
    pub fn is_pending(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the timer. Harmless if it already fired.
    pub fn cancel(self) {
        // Drop does the abort.
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_timer_kind_display() {
        assert_eq!(TimerKind::StatusPoll.to_string(), "status-poll");
        assert_eq!(TimerKind::ALL.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_fire() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let handle = TimerHandle::spawn(TimerKind::Expiry, async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            flag.store(true, Ordering::SeqCst);
        });
        assert!(handle.is_pending());

        handle.cancel();
        tokio::time::sleep(Duration::from_secs(20)).await;

        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_task() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        {
            let _handle = TimerHandle::spawn(TimerKind::Idle, async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                flag.store(true, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_pending_false_after_fire() {
        let handle = TimerHandle::spawn(TimerKind::Refresh, async {
            tokio::time::sleep(Duration::from_secs(1)).await;
        });

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(!handle.is_pending());
    }
}
