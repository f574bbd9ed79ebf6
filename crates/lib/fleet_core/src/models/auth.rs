//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API response types
//! (which carry `#[serde(rename)]` for camelCase wire formats).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Domain user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User with password hash (for internal auth flows only).
#[derive(Debug, Clone)]
pub struct UserWithPassword {
    pub user: User,
    pub password_hash: String,
}

/// Fixed role set. Authorization is flat set membership with no hierarchy:
/// `Admin` does not implicitly satisfy a manager-only gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Operator,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Operator => "operator",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "operator" => Ok(Role::Operator),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Token kind discriminator carried in the claims payload.
///
/// Defaults to `Access` when the claim is absent, so the refresh flow
/// rejects anything but an explicit `Refresh`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[default]
    Access,
    Refresh,
}

/// JWT claims embedded in access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — user ID (standard JWT `sub` claim).
    pub sub: String,
    /// User email.
    pub email: String,
    /// Access/refresh discriminator.
    #[serde(rename = "type", default)]
    pub kind: TokenKind,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::Admin, Role::Manager, Role::Operator, Role::Viewer] {
            assert_eq!(Ok(role), role.as_str().parse());
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn token_kind_defaults_to_access_when_absent() {
        let claims: TokenClaims = serde_json::from_str(
            r#"{"sub":"u1","email":"a@b.c","iat":0,"exp":0}"#,
        )
        .expect("claims without discriminator");
        assert_eq!(TokenKind::Access, claims.kind);
    }

    #[test]
    fn refresh_kind_serializes_as_type_field() {
        let claims = TokenClaims {
            sub: "u1".into(),
            email: "a@b.c".into(),
            kind: TokenKind::Refresh,
            iat: 1,
            exp: 2,
        };
        let json = serde_json::to_string(&claims).expect("serialize claims");
        assert!(json.contains(r#""type":"refresh""#), "got: {json}");
    }
}
