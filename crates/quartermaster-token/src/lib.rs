//! Credential handling for Quartermaster.
//!
//! The inventory front end receives a signed bearer token from the backend
//! after login. The client never verifies the signature (that's the
//! backend's job); it only needs to read the claims inside the token to know
//! WHO is logged in, WHAT role they have, and WHEN the token stops working.
//!
//! - **Claims** ([`Claims`], [`Role`]): the decoded payload.
//! - **Codec** ([`TokenCodec`]): splitting, base64url-decoding and parsing
//!   a token, plus the expiry check.
//! - **Errors** ([`DecodeError`], [`EncodeError`], [`InvalidTokenError`]): what can go wrong.
//!
//! ```text
//! token string → TokenCodec::decode → Claims → TokenCodec::is_valid(now)
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod claims;
mod codec;
mod error;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use claims::{Claims, Role};
pub use codec::{MAX_TOKEN_LEN, TokenCodec};
pub use error::{DecodeError, EncodeError, InvalidTokenError};
