//! Token decoding and validation.
//!
//! Tokens are JWT-shaped: `header.payload.signature`, each segment
//! base64url-encoded. Only the payload matters to the client. The header
//! and signature are the backend's business, so they are checked for
//! presence but never interpreted.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;

use crate::{Claims, DecodeError, EncodeError, InvalidTokenError, Role};

/// Upper bound on accepted token length, in bytes.
///
/// Real tokens from the backend are a few hundred bytes. Anything this big
/// is garbage (or hostile) and is rejected before we allocate for it.
pub const MAX_TOKEN_LEN: usize = 16 * 1024;

/// Header used by [`TokenCodec::encode_unsigned`]: `{"alg":"none","typ":"JWT"}`.
const UNSIGNED_HEADER: &str = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0";

/// Decodes tokens into [`Claims`] and checks their expiry.
///
/// Stateless; every method is an associated function.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCodec;

/// The payload as it appears on the wire. Only `exp` and `role` are
/// mandatory; the subject may arrive as `sub` or as the backend's `id`
/// (string or number).
#[derive(Deserialize)]
struct WireClaims {
    sub: Option<WireSubject>,
    id: Option<WireSubject>,
    role: Option<String>,
    exp: Option<WireExpiry>,
    email: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireSubject {
    Text(String),
    Number(u64),
}

impl WireSubject {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(n) => n.to_string(),
        }
    }
}

/// `exp` is normally an integer, but some issuers emit it as a float
/// (`1700000000.0`). Fractions are floored.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireExpiry {
    Whole(u64),
    Fractional(f64),
}

impl WireExpiry {
    fn into_secs(self) -> Result<u64, DecodeError> {
        match self {
            Self::Whole(secs) => Ok(secs),
            Self::Fractional(secs) if secs.is_finite() && secs >= 0.0 => {
                Ok(secs.floor() as u64)
            }
            Self::Fractional(secs) => {
                Err(malformed(format!("`exp` claim {secs} is not a valid time")))
            }
        }
    }
}

impl TokenCodec {
    /// Decodes the payload segment of `token`.
    ///
    /// # Errors
    /// Returns [`DecodeError::Malformed`] when the token is too long, doesn't
    /// have exactly three segments, has an empty header or payload, the
    /// payload isn't base64url JSON, or a required claim is missing.
    pub fn decode(token: &str) -> Result<Claims, DecodeError> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(malformed(format!(
                "token is {} bytes, limit is {MAX_TOKEN_LEN}",
                token.len()
            )));
        }

        let mut segments = token.split('.');
        let (Some(header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(malformed("expected 3 dot-separated segments"));
        };
        if header.is_empty() || payload.is_empty() {
            return Err(malformed("empty header or payload segment"));
        }

        // Some issuers keep the `=` padding even in base64url.
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| malformed(format!("payload is not base64url: {e}")))?;

        let wire: WireClaims = serde_json::from_slice(&bytes)
            .map_err(|e| malformed(format!("payload is not a claims object: {e}")))?;

        let subject = wire
            .sub
            .or(wire.id)
            .map(WireSubject::into_string)
            .ok_or_else(|| malformed("missing `sub` claim"))?;
        let role = wire.role.ok_or_else(|| malformed("missing `role` claim"))?;
        let expires_at = wire
            .exp
            .ok_or_else(|| malformed("missing `exp` claim"))?
            .into_secs()?;

        Ok(Claims {
            subject,
            role: Role::from(role),
            expires_at,
            email: wire.email,
            name: wire.name,
        })
    }

    /// `false` if `claims` is absent or `expires_at <= now`.
    ///
    /// `now` is a duration since the Unix epoch, as reported by the session
    /// clock.
    pub fn is_valid(claims: Option<&Claims>, now: Duration) -> bool {
        claims.is_some_and(|c| c.is_valid_at(now))
    }

    /// Decodes `token` and rejects it if it has already expired at `now`.
    ///
    /// # Errors
    /// - [`InvalidTokenError::Malformed`]: see [`TokenCodec::decode`]
    /// - [`InvalidTokenError::Expired`]: `expires_at <= now`
    pub fn validate(
        token: &str,
        now: Duration,
    ) -> Result<Claims, InvalidTokenError> {
        let claims = Self::decode(token)?;
        if !claims.is_valid_at(now) {
            return Err(InvalidTokenError::Expired {
                expires_at: claims.expires_at,
            });
        }
        Ok(claims)
    }

    /// Builds an unsigned (`alg: none`) token carrying `claims`.
    ///
    /// Meant for fixtures and development backends. The signature segment
    /// is empty, which [`TokenCodec::decode`] accepts since it never checks
    /// signatures anyway.
    ///
    /// # Errors
    /// Returns [`EncodeError`] if the claims can't be serialized.
    pub fn encode_unsigned(claims: &Claims) -> Result<String, EncodeError> {
        let payload = serde_json::to_vec(claims)?;
        Ok(format!("{UNSIGNED_HEADER}.{}.", URL_SAFE_NO_PAD.encode(payload)))
    }
}

fn malformed(reason: impl Into<String>) -> DecodeError {
    DecodeError::Malformed(reason.into())
}
