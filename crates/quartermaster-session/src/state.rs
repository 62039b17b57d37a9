//! Session state as seen from outside the coordinator.
//!
//! The coordinator task owns the real state. What it publishes is a
//! [`SessionSnapshot`]: a read-only copy updated after every transition, so
//! the UI can ask "who's logged in?" without a round trip to the task.

use std::fmt;
use std::time::Duration;

use quartermaster_timer::TimerKind;
use quartermaster_token::{Claims, TokenCodec};
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// AuthState
// ---------------------------------------------------------------------------

/// The coordinator's two states.
///
/// ```text
///   Anonymous ──(login / admin_login)──→ Authenticated
///       ↑                                    │  ↺ refresh-driven relogin
///       └──────────(logout, any cause)───────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

// ---------------------------------------------------------------------------
// LogoutCause
// ---------------------------------------------------------------------------

/// Why a session ended.
///
/// Reported to the UI so it can pick a message. Teardown is identical for
/// every cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogoutCause {
    /// The user clicked "log out".
    UserInitiated,
    /// No activity for the configured idle timeout.
    IdleTimeout,
    /// The token reached its `exp`.
    HardExpiry,
    /// The status endpoint reported the account as inactive.
    AccountDeactivated,
    /// The application invalidated the session, e.g. after a 401 from an
    /// inventory endpoint.
    ManualInvalidate,
}

impl fmt::Display for LogoutCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserInitiated => write!(f, "user-initiated"),
            Self::IdleTimeout => write!(f, "idle-timeout"),
            Self::HardExpiry => write!(f, "hard-expiry"),
            Self::AccountDeactivated => write!(f, "account-deactivated"),
            Self::ManualInvalidate => write!(f, "manual-invalidate"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// Broadcast to subscribers on every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session started, or was extended by a refreshed token.
    LoggedIn {
        subject: String,
        epoch: u64,
        /// `true` when a background refresh produced this login.
        refreshed: bool,
    },
    /// An authenticated session ended.
    LoggedOut { cause: LogoutCause },
}

// ---------------------------------------------------------------------------
// SessionSnapshot
// ---------------------------------------------------------------------------

/// Published copy of the coordinator's state.
///
/// Derived answers (`is_authenticated`, `is_admin`, ...) take `now` and are
/// recomputed on every call. The snapshot never caches a verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Claims of the current token, if any.
    pub claims: Option<Claims>,
    /// Session generation counter.
    pub epoch: u64,
    /// `true` only while the stored token is being restored at startup.
    pub loading: bool,
    /// Cause of the most recent logout, if there has been one.
    pub last_logout: Option<LogoutCause>,
}

impl SessionSnapshot {
    /// `Authenticated` whenever claims are held, even if they are about to
    /// be torn down by the expiry watchdog.
    pub fn state(&self) -> AuthState {
        if self.claims.is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        }
    }

    /// Claims present and not yet expired at `now`.
    pub fn is_authenticated(&self, now: Duration) -> bool {
        TokenCodec::is_valid(self.claims.as_ref(), now)
    }

    /// Authenticated with the admin role.
    pub fn is_admin(&self, now: Duration) -> bool {
        self.current_user(now).is_some_and(|c| c.role.is_admin())
    }

    /// Authenticated with the staff or user role. Admins are not staff.
    pub fn is_staff(&self, now: Duration) -> bool {
        self.current_user(now).is_some_and(|c| c.role.is_staff())
    }

    /// The current claims, if still valid at `now`.
    pub fn current_user(&self, now: Duration) -> Option<&Claims> {
        self.claims.as_ref().filter(|c| c.is_valid_at(now))
    }
}

// ---------------------------------------------------------------------------
// TimerReport
// ---------------------------------------------------------------------------

/// Which session timers are live, and when they fire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerReport {
    /// When the idle countdown ends.
    pub idle_deadline: Option<Instant>,
    /// Unix time of the scheduled refresh.
    pub refresh_at: Option<Duration>,
    /// Unix time the expiry watchdog fires at.
    pub expires_at: Option<Duration>,
    /// Whether the status poller is running.
    pub status_polling: bool,
    /// Whether activity signals are being listened for.
    pub activity_subscribed: bool,
}

impl TimerReport {
    /// The kinds with a live timer, in [`TimerKind::ALL`] order.
    pub fn armed(&self) -> Vec<TimerKind> {
        TimerKind::ALL
            .into_iter()
            .filter(|kind| match kind {
                TimerKind::Idle => self.idle_deadline.is_some(),
                TimerKind::Refresh => self.refresh_at.is_some(),
                TimerKind::Expiry => self.expires_at.is_some(),
                TimerKind::StatusPoll => self.status_polling,
            })
            .collect()
    }

    /// `true` when nothing at all is running.
    pub fn is_quiet(&self) -> bool {
        self.armed().is_empty() && !self.activity_subscribed
    }
}

#[cfg(test)]
mod tests {
    use quartermaster_token::Role;

    use super::*;

    fn snapshot_with(role: Role, exp: u64) -> SessionSnapshot {
        SessionSnapshot {
            claims: Some(Claims::new("1", role, exp)),
            epoch: 1,
            ..SessionSnapshot::default()
        }
    }

    fn at(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_empty_snapshot_is_anonymous() {
        let snap = SessionSnapshot::default();
        assert_eq!(snap.state(), AuthState::Anonymous);
        assert!(!snap.is_authenticated(at(0)));
        assert!(snap.current_user(at(0)).is_none());
    }

    #[test]
    fn test_derived_flags_recompute_against_now() {
        let snap = snapshot_with(Role::Admin, 100);

        assert!(snap.is_authenticated(at(99)));
        assert!(snap.is_admin(at(99)));
        // Same snapshot, later clock: everything flips without a transition.
        assert!(!snap.is_authenticated(at(100)));
        assert!(!snap.is_admin(at(100)));
        assert_eq!(snap.state(), AuthState::Authenticated);
    }

    #[test]
    fn test_staff_includes_user_but_not_admin() {
        assert!(snapshot_with(Role::Staff, 100).is_staff(at(0)));
        assert!(snapshot_with(Role::User, 100).is_staff(at(0)));
        assert!(!snapshot_with(Role::Admin, 100).is_staff(at(0)));
        assert!(!snapshot_with(Role::Other("guest".into()), 100).is_staff(at(0)));
    }

    #[test]
    fn test_timer_report_armed_lists_live_kinds() {
        let report = TimerReport {
            refresh_at: Some(at(10)),
            status_polling: true,
            ..TimerReport::default()
        };
        assert_eq!(report.armed(), vec![TimerKind::Refresh, TimerKind::StatusPoll]);
        assert!(!report.is_quiet());
        assert!(TimerReport::default().is_quiet());
    }

    #[test]
    fn test_logout_cause_display() {
        assert_eq!(LogoutCause::AccountDeactivated.to_string(), "account-deactivated");
    }
}
