//! Wall-clock source for expiry arithmetic.
//!
//! Token expiry is an absolute Unix timestamp, but Tokio timers run on a
//! monotonic clock. [`Clock::now`] bridges the two by reporting "now" as a
//! duration since the Unix epoch.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

/// Reports the current time as a duration since the Unix epoch.
pub trait Clock: Send + Sync + 'static {
    /// Current time since `1970-01-01T00:00:00Z`.
    fn now(&self) -> Duration;
}

/// Reads `SystemTime` on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        // A system clock set before 1970 is treated as the epoch itself.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

/// A wall clock pinned to a Unix time at creation and advanced by Tokio's
/// monotonic clock afterwards.
///
/// Two properties fall out of this:
/// - a system clock jump after startup can't make a token look expired (or
///   alive) early;
/// - under `tokio::time::pause()` the clock advances exactly as far as the
///   paused timers do, which is what the scheduler tests rely on.
#[derive(Debug, Clone, Copy)]
pub struct AnchoredClock {
    anchor: Duration,
    started: Instant,
}

impl AnchoredClock {
    /// Anchors the clock at `unix_time` as of this instant.
    pub fn new(unix_time: Duration) -> Self {
        Self {
            anchor: unix_time,
            started: Instant::now(),
        }
    }

    /// Anchors the clock at the current system time.
    pub fn starting_now() -> Self {
        Self::new(SystemClock.now())
    }
}

impl Clock for AnchoredClock {
    fn now(&self) -> Duration {
        self.anchor + self.started.elapsed()
    }
}
