//! Session timers for Quartermaster.
//!
//! A logged-in session is kept honest by four independent timers plus one
//! input throttle:
//!
//! | Component | Fires | Outcome |
//! |---|---|---|
//! | [`IdleTimeoutScheduler`] | after a quiet period, pushed back by activity | logout |
//! | [`RefreshScheduler`] | `buffer` before token expiry | new token, or nothing |
//! | [`ExpiryWatchdog`] | exactly at token expiry | logout |
//! | [`StatusPoller`] | after an initial delay, then periodically | logout if deactivated |
//! | [`ActivityMonitor`] | at most once per throttle window | idle timer pushed back |
//!
//! Every scheduler follows the same rules:
//! - `arm()` cancels the scheduler's own previous timer first, so there is
//!   never more than one live [`TimerHandle`] per [`TimerKind`];
//! - `cancel()` is idempotent;
//! - callbacks run on the timer task and are expected to hand off to the
//!   session coordinator, which owns all session state.
//!
//! Timers run on Tokio's clock, so tests drive them with
//! `#[tokio::test(start_paused = true)]`.

mod activity;
mod clock;
mod expiry;
mod handle;
mod idle;
mod refresh;
mod status;

pub use activity::{ActivityMonitor, ActivitySignal};
pub use clock::{AnchoredClock, Clock, SystemClock};
pub use expiry::ExpiryWatchdog;
pub use handle::{TimerHandle, TimerKind};
pub use idle::IdleTimeoutScheduler;
pub use refresh::RefreshScheduler;
pub use status::StatusPoller;
