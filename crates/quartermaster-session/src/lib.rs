//! Session lifecycle for the Quartermaster front end.
//!
//! A [`SessionCoordinator`] owns the authenticated session: it validates
//! and persists the token, then keeps four timers running for as long as
//! the session lives.
//!
//! | Timer | Ends the session with |
//! |-------|-----------------------|
//! | idle countdown, reset by user activity | [`LogoutCause::IdleTimeout`] |
//! | hard expiry at the token's `exp` | [`LogoutCause::HardExpiry`] |
//! | account-status poll | [`LogoutCause::AccountDeactivated`] |
//! | proactive refresh before `exp` | never; a new token re-arms everything |
//!
//! Every transition bumps an *epoch*. Timer callbacks carry the epoch they
//! were armed in, so a refresh that returns after logout is simply dropped.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use quartermaster_gateway::{GatewayConfig, HttpGateway, MemoryStore};
//! use quartermaster_session::{SessionConfig, SessionCoordinator};
//! use quartermaster_timer::SystemClock;
//!
//! # async fn run(token: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = Arc::new(HttpGateway::new(GatewayConfig::default())?);
//! let session = SessionCoordinator::start(
//!     SessionConfig::default(),
//!     MemoryStore::new(),
//!     Arc::clone(&gateway),
//!     gateway,
//!     SystemClock,
//! );
//! session.ready().await?;
//! session.login(token).await?;
//! assert!(session.is_authenticated());
//! # Ok(())
//! # }
//! ```

mod config;
mod coordinator;
mod error;
mod state;

pub use config::SessionConfig;
pub use coordinator::SessionCoordinator;
pub use error::SessionError;
pub use state::{
    AuthState, LogoutCause, SessionEvent, SessionSnapshot, TimerReport,
};
