//! Unified error type for the Quartermaster crates.

use quartermaster_gateway::{
    GatewayError, RefreshError, StatusCheckError, StoreError,
};
use quartermaster_session::SessionError;
use quartermaster_token::{DecodeError, EncodeError, InvalidTokenError};

/// Top-level error that wraps every crate-specific error.
///
/// `?` converts any of them, so application code that mixes session calls
/// with direct gateway or store use needs only this one type.
#[derive(Debug, thiserror::Error)]
pub enum QuartermasterError {
    /// Login refused, or the coordinator is gone.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The token slot could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A direct refresh call failed.
    #[error(transparent)]
    Refresh(#[from] RefreshError),

    /// A direct status check failed.
    #[error(transparent)]
    StatusCheck(#[from] StatusCheckError),

    /// A token could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Claims could not be encoded into a token.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// A token was malformed or expired.
    #[error(transparent)]
    InvalidToken(#[from] InvalidTokenError),

    /// The HTTP gateway could not be built.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[cfg(test)]
mod tests {
    use quartermaster_token::Role;

    use super::*;

    #[test]
    fn test_from_session_error() {
        let err: QuartermasterError =
            SessionError::InsufficientPrivilege { role: Role::Staff }.into();
        assert!(matches!(err, QuartermasterError::Session(_)));
        assert!(err.to_string().contains("staff"));
    }

    #[test]
    fn test_from_store_error() {
        let err: QuartermasterError = StoreError::Poisoned.into();
        assert!(matches!(err, QuartermasterError::Store(_)));
    }

    #[test]
    fn test_from_refresh_error() {
        let err: QuartermasterError = RefreshError::Rejected { status: 401 }.into();
        assert!(matches!(err, QuartermasterError::Refresh(_)));
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn test_from_status_check_error() {
        let err: QuartermasterError =
            StatusCheckError::Transport("reset".into()).into();
        assert!(matches!(err, QuartermasterError::StatusCheck(_)));
    }

    #[test]
    fn test_from_decode_error() {
        let err: QuartermasterError = DecodeError::Malformed("x".into()).into();
        assert!(matches!(err, QuartermasterError::Decode(_)));
    }

    #[test]
    fn test_from_encode_error() {
        let cause = serde_json::from_str::<u64>("x").unwrap_err();
        let err: QuartermasterError = EncodeError::from(cause).into();
        assert!(matches!(err, QuartermasterError::Encode(_)));
        assert!(err.to_string().contains("encode"));
    }

    #[test]
    fn test_from_invalid_token_error() {
        let err: QuartermasterError =
            InvalidTokenError::Expired { expires_at: 1 }.into();
        assert!(matches!(err, QuartermasterError::InvalidToken(_)));
    }

    #[test]
    fn test_from_gateway_error() {
        let err: QuartermasterError = GatewayError::Client("tls".into()).into();
        assert!(matches!(err, QuartermasterError::Gateway(_)));
        assert!(err.to_string().contains("tls"));
    }
}
