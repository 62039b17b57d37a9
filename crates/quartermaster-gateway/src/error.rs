//! Error types for the gateway layer.

/// Failure while exchanging a token for a new one.
///
/// Never surfaces to users: the refresh scheduler logs it and lets the
/// expiry watchdog end the session.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// The request never got a response (DNS, connect, timeout, ...).
    #[error("refresh transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("refresh rejected with status {status}")]
    Rejected {
        /// HTTP status code.
        status: u16,
    },

    /// The body didn't contain a token.
    #[error("refresh response unreadable: {0}")]
    InvalidResponse(String),
}

/// Failure while checking account status. Treated as "active" by callers.
#[derive(Debug, thiserror::Error)]
pub enum StatusCheckError {
    /// The request never got a response.
    #[error("status check transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("status check rejected with status {status}")]
    Rejected {
        /// HTTP status code.
        status: u16,
    },

    /// The body wasn't `{"active": bool}`.
    #[error("status response unreadable: {0}")]
    InvalidResponse(String),
}

/// Failure reading or writing the persisted token slot.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem error from [`FileStore`](crate::FileStore).
    #[error("token store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A thread panicked while holding the in-memory slot.
    #[error("token store lock poisoned")]
    Poisoned,
}

/// Failure constructing a gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The HTTP client could not be built (bad TLS setup, etc.).
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}
