//! Throttled user-activity signal.
//!
//! The host UI forwards raw interaction events (pointer, keyboard, scroll,
//! touch) through [`ActivityMonitor::record`]. A mouse move alone can fire
//! dozens of events per second, and each one re-arming the idle timer would
//! mean respawning a task per event. The monitor collapses every burst into
//! a single callback at the end of a fixed window (trailing edge).
//!
//! ```text
//! signals:   x  x x   x            x
//! window:    [---1s---]            [---1s---]
//! callback:            ^                     ^
//! ```

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

/// The interaction events that count as "the user is still here".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivitySignal {
    PointerDown,
    PointerMove,
    KeyPress,
    Scroll,
    TouchStart,
    Click,
}

impl ActivitySignal {
    /// The complete listened-for set.
    pub const ALL: [Self; 6] = [
        Self::PointerDown,
        Self::PointerMove,
        Self::KeyPress,
        Self::Scroll,
        Self::TouchStart,
        Self::Click,
    ];

    /// Maps a DOM event name to a signal. Events outside the set (focus,
    /// resize, visibility, ...) return `None` and don't count as activity.
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            "mousedown" | "pointerdown" => Some(Self::PointerDown),
            "mousemove" | "pointermove" => Some(Self::PointerMove),
            "keypress" | "keydown" => Some(Self::KeyPress),
            "scroll" => Some(Self::Scroll),
            "touchstart" => Some(Self::TouchStart),
            "click" => Some(Self::Click),
            _ => None,
        }
    }
}

/// Trailing-edge throttle over [`ActivitySignal`]s.
///
/// The listener runs as a task; unsubscribing (or dropping the monitor)
/// aborts it together with any window in progress.
#[derive(Debug)]
pub struct ActivityMonitor {
    window: Duration,
    sender: Option<mpsc::UnboundedSender<ActivitySignal>>,
    listener: Option<JoinHandle<()>>,
}

impl ActivityMonitor {
    /// Creates an unsubscribed monitor that throttles to one callback per
    /// `window`.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            sender: None,
            listener: None,
        }
    }

    /// Starts listening. `on_activity` runs at most once per window.
    ///
    /// Subscribing again replaces the previous listener.
    pub fn subscribe<F>(&mut self, on_activity: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.unsubscribe();

        let (tx, rx) = mpsc::unbounded_channel();
        let window = self.window;
        self.sender = Some(tx);
        self.listener = Some(tokio::spawn(throttle(rx, window, on_activity)));
        tracing::debug!(window_ms = window.as_millis() as u64, "activity monitor subscribed");
    }

    /// Feeds one signal in. Does nothing while unsubscribed.
    pub fn record(&self, signal: ActivitySignal) {
        if let Some(tx) = &self.sender {
            // A closed channel means the listener is gone; nothing to do.
            let _ = tx.send(signal);
        }
    }

    /// Stops listening. Idempotent. A window in progress is dropped
    /// without a callback.
    pub fn unsubscribe(&mut self) {
        self.sender = None;
        if let Some(listener) = self.listener.take() {
            listener.abort();
            tracing::debug!("activity monitor unsubscribed");
        }
    }

    /// Whether a listener is active.
    pub fn is_subscribed(&self) -> bool {
        self.listener.is_some()
    }

    /// The throttle window.
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Drop for ActivityMonitor {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

async fn throttle<F>(
    mut rx: mpsc::UnboundedReceiver<ActivitySignal>,
    window: Duration,
    on_activity: F,
) where
    F: Fn() + Send + Sync + 'static,
{
    // The first signal of a quiet period opens a window; everything that
    // arrives before the boundary is absorbed into it.
    while let Some(first) = rx.recv().await {
        let boundary = Instant::now() + window;
        let mut absorbed = 0u32;
        loop {
            tokio::select! {
                _ = sleep_until(boundary) => break,
                next = rx.recv() => match next {
                    Some(_) => absorbed += 1,
                    None => return,
                },
            }
        }
        tracing::trace!(?first, absorbed, "activity window closed");
        on_activity();
    }
}
