//! Backend gateways and token persistence for Quartermaster.
//!
//! The session coordinator talks to the outside world through three narrow
//! seams, each a trait so tests can swap in mocks:
//!
//! - [`AuthGateway`]: exchanges the current token for a fresh one.
//! - [`AccountStatusGateway`]: asks whether the account is still active.
//! - [`SessionStore`]: the one persisted token slot that survives restarts.
//!
//! # Feature Flags
//!
//! - `http` (default): [`HttpGateway`], a `reqwest` implementation of both
//!   gateways against the inventory REST backend.

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "http")]
mod http;
mod store;

pub use error::{GatewayError, RefreshError, StatusCheckError, StoreError};
#[cfg(feature = "http")]
pub use http::{GatewayConfig, HttpGateway};
pub use store::{FileStore, MemoryStore};

use serde::{Deserialize, Serialize};

/// Server-side account state as reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatus {
    /// `false` once an administrator has deactivated the account.
    pub active: bool,
}

/// Exchanges a still-valid token for a new one.
///
/// `Send + Sync + 'static` because the refresh call runs inside a spawned
/// timer task that outlives the caller.
pub trait AuthGateway: Send + Sync + 'static {
    /// Returns the replacement token.
    ///
    /// # Errors
    /// Returns [`RefreshError`] on transport failure, a non-success status,
    /// or an unreadable response body.
    fn refresh(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<String, RefreshError>> + Send;
}

/// Revalidates the account behind a token.
pub trait AccountStatusGateway: Send + Sync + 'static {
    /// Fetches the current account status.
    ///
    /// Callers treat every error as "still active" (fail-open), so
    /// implementations should not retry internally.
    fn check_status(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<AccountStatus, StatusCheckError>>
    + Send;
}

/// A single persisted token slot.
///
/// Synchronous on purpose: the slot is tiny and every implementation we
/// ship finishes in microseconds, so the coordinator can call it without
/// yielding in the middle of a state transition.
pub trait SessionStore: Send + Sync + 'static {
    /// Returns the stored token, if any.
    fn get(&self) -> Result<Option<String>, StoreError>;

    /// Replaces the stored token.
    fn set(&self, token: &str) -> Result<(), StoreError>;

    /// Empties the slot. Clearing an empty slot is not an error.
    fn clear(&self) -> Result<(), StoreError>;
}
