//! Session timing configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Timeouts and intervals for the session timers.
///
/// Every field has a default, so a config file only needs to mention what
/// it changes:
///
/// ```rust
/// use quartermaster_session::SessionConfig;
///
/// let config = SessionConfig {
///     idle_timeout_secs: 600,
///     ..SessionConfig::default()
/// };
/// assert_eq!(config.status_poll_interval_secs, 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Inactivity before automatic logout. Default: 180 seconds.
    pub idle_timeout_secs: u64,

    /// How long before token expiry the refresh fires. Default: 300 seconds.
    pub refresh_buffer_secs: u64,

    /// Delay before the first account-status check. Default: 5 seconds.
    pub status_initial_delay_secs: u64,

    /// Interval between account-status checks. Default: 30 seconds.
    pub status_poll_interval_secs: u64,

    /// Activity throttle window. Default: 1000 ms.
    pub activity_throttle_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 180,
            refresh_buffer_secs: 300,
            status_initial_delay_secs: 5,
            status_poll_interval_secs: 30,
            activity_throttle_ms: 1_000,
        }
    }
}

impl SessionConfig {
    /// Fixes values that would break the timers.
    ///
    /// Called automatically by `SessionCoordinator::start`. Rules:
    /// - `idle_timeout_secs` and `status_poll_interval_secs` are at least 1
    ///   (a zero interval panics inside Tokio, a zero idle timeout would log
    ///   users out on the spot);
    /// - `activity_throttle_ms` is at least 1.
    pub fn validated(mut self) -> Self {
        if self.idle_timeout_secs == 0 {
            warn!("idle_timeout_secs is 0, raising to 1");
            self.idle_timeout_secs = 1;
        }
        if self.status_poll_interval_secs == 0 {
            warn!("status_poll_interval_secs is 0, raising to 1");
            self.status_poll_interval_secs = 1;
        }
        if self.activity_throttle_ms == 0 {
            warn!("activity_throttle_ms is 0, raising to 1");
            self.activity_throttle_ms = 1;
        }
        self
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn refresh_buffer(&self) -> Duration {
        Duration::from_secs(self.refresh_buffer_secs)
    }

    pub fn status_initial_delay(&self) -> Duration {
        Duration::from_secs(self.status_initial_delay_secs)
    }

    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_secs(self.status_poll_interval_secs)
    }

    pub fn activity_throttle(&self) -> Duration {
        Duration::from_millis(self.activity_throttle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_front_end_constants() {
        let config = SessionConfig::default();
        assert_eq!(config.idle_timeout(), Duration::from_secs(180));
        assert_eq!(config.refresh_buffer(), Duration::from_secs(300));
        assert_eq!(config.status_initial_delay(), Duration::from_secs(5));
        assert_eq!(config.status_poll_interval(), Duration::from_secs(30));
        assert_eq!(config.activity_throttle(), Duration::from_secs(1));
    }

    #[test]
    fn test_validated_raises_zero_values() {
        let config = SessionConfig {
            idle_timeout_secs: 0,
            status_poll_interval_secs: 0,
            activity_throttle_ms: 0,
            ..SessionConfig::default()
        }
        .validated();

        assert_eq!(config.idle_timeout_secs, 1);
        assert_eq!(config.status_poll_interval_secs, 1);
        assert_eq!(config.activity_throttle_ms, 1);
    }

    #[test]
    fn test_validated_leaves_sane_config_alone() {
        let config = SessionConfig::default();
        assert_eq!(config.clone().validated(), config);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"idle_timeout_secs": 900}"#).unwrap();
        assert_eq!(config.idle_timeout_secs, 900);
        assert_eq!(config.refresh_buffer_secs, 300);
    }

    #[test]
    fn test_zero_refresh_buffer_is_allowed() {
        let config = SessionConfig {
            refresh_buffer_secs: 0,
            ..SessionConfig::default()
        };
        assert_eq!(config.validated().refresh_buffer_secs, 0);
    }
}
