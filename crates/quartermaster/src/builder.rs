//! One-call setup for the common case: HTTP backend, system clock, and a
//! memory or file token store.

use std::path::PathBuf;
use std::sync::Arc;

use quartermaster_gateway::{FileStore, GatewayConfig, HttpGateway, MemoryStore};
use quartermaster_session::{SessionConfig, SessionCoordinator};
use quartermaster_timer::SystemClock;
use serde::{Deserialize, Serialize};

use crate::{QuartermasterError, TokenStore};

/// Everything needed to start a session coordinator against a real
/// backend.
///
/// Deserializes from a config file section; every field is optional:
///
/// ```json
/// {
///   "session": { "idle_timeout_secs": 600 },
///   "gateway": { "base_url": "https://inventory.example.com/api" },
///   "token_file": "/var/lib/quartermaster/token"
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuartermasterConfig {
    /// Timer settings.
    pub session: SessionConfig,
    /// Backend location and request timeout.
    pub gateway: GatewayConfig,
    /// Where to persist the token. `None` keeps it in memory only.
    pub token_file: Option<PathBuf>,
}

/// Builder for a [`SessionCoordinator`] wired to [`HttpGateway`].
///
/// # Example
///
/// ```rust,no_run
/// use quartermaster::QuartermasterBuilder;
///
/// # async fn run() -> Result<(), quartermaster::QuartermasterError> {
/// let session = QuartermasterBuilder::new()
///     .base_url("https://inventory.example.com/api")
///     .token_file("/tmp/quartermaster-token")
///     .start()?;
/// session.ready().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct QuartermasterBuilder {
    config: QuartermasterConfig,
}

impl QuartermasterBuilder {
    /// Creates a builder with default settings and an in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every setting with `config`.
    pub fn config(mut self, config: QuartermasterConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the timer configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Sets the backend configuration.
    pub fn gateway_config(mut self, config: GatewayConfig) -> Self {
        self.config.gateway = config;
        self
    }

    /// Points the gateway at `base_url`, keeping the other gateway
    /// settings.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.gateway.base_url = base_url.into();
        self
    }

    /// Persists the token to `path` so sessions survive restarts.
    pub fn token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.token_file = Some(path.into());
        self
    }

    /// Builds the gateway and store, then spawns the coordinator.
    ///
    /// # Errors
    /// [`QuartermasterError::Gateway`] if the HTTP client can't be built.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn start(self) -> Result<SessionCoordinator, QuartermasterError> {
        let QuartermasterConfig {
            session,
            gateway,
            token_file,
        } = self.config;

        tracing::info!(
            base_url = %gateway.base_url,
            persistent = token_file.is_some(),
            "starting session coordinator"
        );

        let gateway = Arc::new(HttpGateway::new(gateway)?);
        let store = match token_file {
            Some(path) => TokenStore::File(FileStore::new(path)),
            None => TokenStore::Memory(MemoryStore::new()),
        };

        Ok(SessionCoordinator::start(
            session,
            store,
            Arc::clone(&gateway),
            gateway,
            SystemClock,
        ))
    }
}
