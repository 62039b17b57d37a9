//! Error types for the session layer.

use quartermaster_token::{InvalidTokenError, Role};

/// Errors returned to callers of the coordinator's public API.
///
/// Only user actions (`login`, `admin_login`) can fail. Background failures
/// (refresh, status checks, token persistence) are logged and absorbed by
/// the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The token is malformed or already expired.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] InvalidTokenError),

    /// `admin_login` was given a valid token for a non-admin account.
    #[error("role `{role}` may not use the admin console")]
    InsufficientPrivilege {
        /// The role the token actually carries.
        role: Role,
    },

    /// The coordinator task has stopped (shut down, or its runtime is gone).
    #[error("session coordinator is not running")]
    Unavailable,
}

#[cfg(test)]
mod tests {
    use quartermaster_token::DecodeError;

    use super::*;

    #[test]
    fn test_from_invalid_token_error() {
        let err: SessionError = InvalidTokenError::Expired { expires_at: 5 }.into();
        assert!(matches!(err, SessionError::InvalidToken(_)));
        assert_eq!(err.to_string(), "invalid token: token expired at 5");
    }

    #[test]
    fn test_malformed_chain_reads_naturally() {
        let err: SessionError =
            InvalidTokenError::from(DecodeError::Malformed("no dots".into())).into();
        assert_eq!(err.to_string(), "invalid token: malformed token: no dots");
    }

    #[test]
    fn test_insufficient_privilege_names_role() {
        let err = SessionError::InsufficientPrivilege { role: Role::User };
        assert_eq!(err.to_string(), "role `user` may not use the admin console");
    }
}
