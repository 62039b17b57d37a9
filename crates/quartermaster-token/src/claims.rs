//! Decoded credential payload.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The account role carried in the `role` claim.
///
/// Parsing is case-sensitive and never fails: anything the client doesn't
/// know about lands in [`Role::Other`] and simply grants nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Full access, including the admin console.
    Admin,
    /// Inventory staff.
    Staff,
    /// Regular account. Treated as staff by the front end.
    User,
    /// A role this client doesn't recognise.
    Other(String),
}

impl Role {
    /// Returns `true` for [`Role::Admin`].
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns `true` for [`Role::Staff`] and [`Role::User`].
    ///
    /// Admins are not staff: the staff screens are gated on these two
    /// roles only.
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Staff | Self::User)
    }

    /// The wire spelling of the role.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::User => "user",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "admin" => Self::Admin,
            "staff" => Self::Staff,
            "user" => Self::User,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

/// The claims the front end reads out of a token.
///
/// A `Claims` value carries no "valid" flag. Validity depends on the clock,
/// so it's recomputed every time with [`Claims::is_valid_at`] (or
/// [`TokenCodec::is_valid`](crate::TokenCodec::is_valid)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    /// Who the token belongs to (`sub`, or the backend's `id`).
    #[serde(rename = "sub")]
    pub subject: String,

    /// Account role.
    pub role: Role,

    /// Expiry instant in Unix seconds (`exp`).
    #[serde(rename = "exp")]
    pub expires_at: u64,

    /// Optional e-mail address, shown in the account menu.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Optional display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Claims {
    /// Creates claims with only the required fields set.
    pub fn new(
        subject: impl Into<String>,
        role: impl Into<Role>,
        expires_at: u64,
    ) -> Self {
        Self {
            subject: subject.into(),
            role: role.into(),
            expires_at,
            email: None,
            name: None,
        }
    }

    /// The expiry as a duration since the Unix epoch, the same scale the
    /// session clock reports `now` in.
    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expires_at)
    }

    /// `true` while `expires_at > now`.
    pub fn is_valid_at(&self, now: Duration) -> bool {
        self.expiry() > now
    }

    /// Time left until expiry, or zero if already expired.
    pub fn remaining(&self, now: Duration) -> Duration {
        self.expiry().saturating_sub(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parses_known_names() {
        assert_eq!(Role::from("admin"), Role::Admin);
        assert_eq!(Role::from("staff"), Role::Staff);
        assert_eq!(Role::from("user"), Role::User);
    }

    #[test]
    fn test_role_parsing_is_case_sensitive() {
        assert_eq!(Role::from("Admin"), Role::Other("Admin".into()));
    }

    #[test]
    fn test_role_staff_excludes_admin() {
        assert!(Role::Staff.is_staff());
        assert!(Role::User.is_staff());
        assert!(!Role::Admin.is_staff());
        assert!(!Role::Other("auditor".into()).is_staff());
    }

    #[test]
    fn test_role_round_trips_unknown_spelling() {
        let role = Role::from("auditor");
        assert_eq!(role.to_string(), "auditor");
        assert_eq!(String::from(role), "auditor");
    }

    #[test]
    fn test_claims_validity_is_strictly_before_expiry() {
        let claims = Claims::new("7", Role::User, 1_000);

        assert!(claims.is_valid_at(Duration::from_secs(999)));
        assert!(!claims.is_valid_at(Duration::from_secs(1_000)));
        assert!(!claims.is_valid_at(Duration::from_secs(1_001)));
    }

    #[test]
    fn test_claims_remaining_saturates() {
        let claims = Claims::new("7", Role::User, 1_000);
        assert_eq!(
            claims.remaining(Duration::from_secs(400)),
            Duration::from_secs(600)
        );
        assert_eq!(claims.remaining(Duration::from_secs(5_000)), Duration::ZERO);
    }
}
