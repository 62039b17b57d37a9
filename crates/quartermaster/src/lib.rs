//! # Quartermaster
//!
//! Client-side session lifecycle for the Quartermaster inventory front end.
//!
//! The front end holds a bearer token and has to keep four timers honest
//! while it's logged in: an idle timeout that user activity pushes back, a
//! proactive refresh shortly before the token expires, a hard-expiry
//! fallback, and a periodic account-status check. This crate re-exports the
//! pieces and adds a builder for the usual wiring.
//!
//! | Crate | Role |
//! |-------|------|
//! | [`token`] | decode and validate tokens |
//! | [`gateway`] | backend and persistence seams, HTTP client |
//! | [`timer`] | the schedulers and activity throttle |
//! | [`session`] | the coordinator that owns them |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quartermaster::prelude::*;
//!
//! # async fn run(token: &str) -> Result<(), QuartermasterError> {
//! quartermaster::telemetry::init();
//!
//! let session = QuartermasterBuilder::new()
//!     .base_url("https://inventory.example.com/api")
//!     .start()?;
//! session.ready().await?;
//!
//! session.login(token).await?;
//! session.record_activity(ActivitySignal::KeyPress);
//!
//! let mut events = session.subscribe();
//! if let Ok(SessionEvent::LoggedOut { cause }) = events.recv().await {
//!     println!("logged out: {cause}");
//! }
//! # Ok(())
//! # }
//! ```

mod builder;
mod error;
mod store;
pub mod telemetry;

pub use builder::{QuartermasterBuilder, QuartermasterConfig};
pub use error::QuartermasterError;
pub use store::TokenStore;

pub use quartermaster_gateway as gateway;
pub use quartermaster_session as session;
pub use quartermaster_timer as timer;
pub use quartermaster_token as token;

/// The types most applications need.
pub mod prelude {
    pub use crate::{QuartermasterBuilder, QuartermasterConfig, QuartermasterError};
    pub use quartermaster_gateway::{
        AccountStatus, AccountStatusGateway, AuthGateway, FileStore,
        GatewayConfig, HttpGateway, MemoryStore, SessionStore,
    };
    pub use quartermaster_session::{
        LogoutCause, SessionConfig, SessionCoordinator, SessionError,
        SessionEvent, SessionSnapshot,
    };
    pub use quartermaster_timer::{ActivitySignal, Clock, SystemClock};
    pub use quartermaster_token::{Claims, Role, TokenCodec};
}
