//! Error types for credential decoding.
//!
//! Two layers: [`DecodeError`] says the token isn't even shaped like a
//! token, [`InvalidTokenError`] is what login callers see and also covers a
//! well-formed token that has already expired.

/// The token could not be decoded into [`Claims`](crate::Claims).
///
/// Tokens come from outside the process (storage, the backend, a pasted
/// string), so every structural problem ends up here instead of panicking.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Wrong number of segments, bad base64, bad JSON, missing claims,
    /// or an oversized token.
    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Why a token was refused by `login`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidTokenError {
    /// The token could not be decoded.
    #[error(transparent)]
    Malformed(#[from] DecodeError),

    /// The token decoded fine but `expires_at` is not in the future.
    #[error("token expired at {expires_at}")]
    Expired {
        /// The `exp` claim, in Unix seconds.
        expires_at: u64,
    },
}

/// Claims could not be serialized into a token payload.
#[derive(Debug, thiserror::Error)]
#[error("failed to encode claims: {0}")]
pub struct EncodeError(#[from] serde_json::Error);
