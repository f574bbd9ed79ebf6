//! Token codec: JWT signing and verification.
//!
//! One shared HS256 secret signs both access and refresh tokens; the two are
//! told apart by the `type` claim, which is checked by callers, not here.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use thiserror::Error;
use tracing::info;

use super::AuthError;
use crate::models::auth::{TokenClaims, TokenKind};

/// Verification failures, as tagged values so callers branch on the variant
/// instead of on library error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token")]
    Malformed,

    #[error("token verification failed")]
    Unknown,
}

/// Sign a token for `user_id` with expiry `ttl` from now.
///
/// `iat` and `exp` are stamped at call time, so tokens signed at different
/// instants with the same ttl validate independently.
pub fn sign_token(
    user_id: &str,
    email: &str,
    kind: TokenKind,
    ttl: Duration,
    secret: &[u8],
) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        kind,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
}

/// Verify signature and expiry, returning the claims on success.
///
/// A token is expired when the current time is at or after its `exp`.
pub fn verify_token(token: &str, secret: &[u8]) -> Result<TokenClaims, TokenError> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    let claims = decode::<TokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => TokenError::Malformed,
            _ => TokenError::Unknown,
        })?;

    // The library accepts exp == now; the contract is at/after.
    if claims.exp <= Utc::now().timestamp() {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

/// Resolve the JWT secret: env var `JWT_SECRET`, else a persisted file.
///
/// There is no hardcoded fallback. First run generates a 64-char secret and
/// persists it so restarts keep existing tokens valid.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET") {
        if !secret.is_empty() {
            return secret;
        }
    }
    let secret_path = jwt_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), "generated new JWT secret");
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fleet")
        .join("jwt-secret")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn access_token_round_trips() {
        let token = sign_token(
            "user-1",
            "alice@example.com",
            TokenKind::Access,
            Duration::hours(1),
            SECRET,
        )
        .expect("sign");
        let claims = verify_token(&token, SECRET).expect("verify");
        assert_eq!("user-1", claims.sub);
        assert_eq!("alice@example.com", claims.email);
        assert_eq!(TokenKind::Access, claims.kind);
        assert_eq!(3600, claims.exp - claims.iat);
    }

    #[test]
    fn refresh_token_carries_discriminator() {
        let token = sign_token(
            "user-1",
            "alice@example.com",
            TokenKind::Refresh,
            Duration::days(7),
            SECRET,
        )
        .expect("sign");
        let claims = verify_token(&token, SECRET).expect("verify");
        assert_eq!(TokenKind::Refresh, claims.kind);
    }

    #[test]
    fn zero_ttl_token_is_expired() {
        let token = sign_token(
            "user-1",
            "alice@example.com",
            TokenKind::Access,
            Duration::zero(),
            SECRET,
        )
        .expect("sign");
        assert_eq!(Err(TokenError::Expired), verify_token(&token, SECRET));
    }

    #[test]
    fn past_expiry_token_is_expired() {
        let token = sign_token(
            "user-1",
            "alice@example.com",
            TokenKind::Access,
            Duration::seconds(-30),
            SECRET,
        )
        .expect("sign");
        assert_eq!(Err(TokenError::Expired), verify_token(&token, SECRET));
    }

    #[test]
    fn tampered_signature_is_malformed() {
        let token = sign_token(
            "user-1",
            "alice@example.com",
            TokenKind::Access,
            Duration::hours(1),
            SECRET,
        )
        .expect("sign");
        let mut tampered = token;
        let last = tampered.pop().expect("nonempty token");
        tampered.push(if last == 'A' { 'B' } else { 'A' });
        assert_eq!(Err(TokenError::Malformed), verify_token(&tampered, SECRET));
    }

    #[test]
    fn wrong_secret_is_malformed() {
        let token = sign_token(
            "user-1",
            "alice@example.com",
            TokenKind::Access,
            Duration::hours(1),
            SECRET,
        )
        .expect("sign");
        assert_eq!(
            Err(TokenError::Malformed),
            verify_token(&token, b"other-secret")
        );
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(
            Err(TokenError::Malformed),
            verify_token("not-a-token", SECRET)
        );
    }

    #[test]
    fn tokens_signed_at_different_instants_validate_independently() {
        let a = sign_token(
            "user-1",
            "alice@example.com",
            TokenKind::Access,
            Duration::hours(1),
            SECRET,
        )
        .expect("sign a");
        let b = sign_token(
            "user-1",
            "alice@example.com",
            TokenKind::Access,
            Duration::hours(1),
            SECRET,
        )
        .expect("sign b");
        assert!(verify_token(&a, SECRET).is_ok());
        assert!(verify_token(&b, SECRET).is_ok());
    }
}
