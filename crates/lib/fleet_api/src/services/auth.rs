//! Authentication service — signup/login/refresh/password flows.
//!
//! Each operation is a short-lived transaction against the store; no state
//! is held between requests. Only this service mints tokens; the middleware
//! and the gateway authorizer verify, never sign.

use chrono::{Duration, Utc};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::info;

use fleet_core::auth::jwt::sign_token;
use fleet_core::auth::{password, queries};
use fleet_core::models::auth::{Role, TokenKind, User};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthenticatedUser;

/// Reset tokens live for one hour.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Generic login failure: the same text for a missing account and a wrong
/// password, so callers cannot probe which emails exist.
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Generic forgot-password acknowledgement, sent whether or not the email
/// matched an account.
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent";

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Public user representation (no password hash).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Role>>,
}

impl AuthUser {
    fn from_user(user: &User, roles: Option<Vec<Role>>) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            roles,
        }
    }
}

/// Signup/login payload: the user plus a fresh token pair.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub user: AuthUser,
    pub token: String,
    pub refresh_token: String,
}

/// Refresh payload: a new token pair.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairData {
    pub token: String,
    pub refresh_token: String,
}

// ---------------------------------------------------------------------------
// Token helpers
// ---------------------------------------------------------------------------

/// Mint an access + refresh pair for a user.
fn issue_token_pair(user_id: &str, email: &str, config: &ApiConfig) -> ApiResult<(String, String)> {
    let secret = config.jwt_secret.as_bytes();
    let access = sign_token(
        user_id,
        email,
        TokenKind::Access,
        config.access_token_ttl,
        secret,
    )?;
    let refresh = sign_token(
        user_id,
        email,
        TokenKind::Refresh,
        config.refresh_token_ttl,
        secret,
    )?;
    Ok((access, refresh))
}

/// Generate an opaque reset token (64 alphanumeric chars).
fn generate_reset_token() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// SHA-256 hash an opaque token for storage; only the digest is persisted.
fn hash_opaque_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Public auth operations
// ---------------------------------------------------------------------------

/// Register a new account with the default `viewer` role.
///
/// Only an *active* user blocks the email: a previously deactivated address
/// may be registered again.
pub async fn signup(
    pool: &PgPool,
    config: &ApiConfig,
    email: &str,
    password_plain: &str,
    first_name: &str,
    last_name: &str,
) -> ApiResult<SessionData> {
    let email = email.to_lowercase();

    if queries::find_user_by_email(pool, &email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let password_hash = password::hash_password(password_plain)?;
    let user = queries::create_user(pool, &email, &password_hash, first_name, last_name).await?;
    queries::assign_role(pool, &user.id, Role::Viewer).await?;

    let (token, refresh_token) = issue_token_pair(&user.id, &user.email, config)?;

    info!(user_id = %user.id, "user registered");
    Ok(SessionData {
        user: AuthUser::from_user(&user, None),
        token,
        refresh_token,
    })
}

/// Authenticate with email + password.
pub async fn login(
    pool: &PgPool,
    config: &ApiConfig,
    email: &str,
    password_plain: &str,
) -> ApiResult<SessionData> {
    let found = match queries::find_user_by_email(pool, email).await? {
        None => return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.into())),
        Some(f) => f,
    };

    if !password::verify_password(password_plain, &found.password_hash)? {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let roles = queries::get_user_roles(pool, &found.user.id).await?;
    let (token, refresh_token) = issue_token_pair(&found.user.id, &found.user.email, config)?;

    Ok(SessionData {
        user: AuthUser::from_user(&found.user, Some(roles)),
        token,
        refresh_token,
    })
}

/// Request a password reset.
///
/// Returns the plaintext token for the (external) delivery channel when the
/// email matched, `None` otherwise; the HTTP layer answers identically in
/// both cases. Any prior token for the user is superseded.
pub async fn forgot_password(pool: &PgPool, email: &str) -> ApiResult<Option<String>> {
    let found = match queries::find_user_by_email(pool, email).await? {
        None => return Ok(None),
        Some(f) => f,
    };

    let token = generate_reset_token();
    let digest = hash_opaque_token(&token);
    let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);
    queries::upsert_reset_token(pool, &found.user.id, &digest, expires_at).await?;

    info!(user_id = %found.user.id, "password reset requested");
    Ok(Some(token))
}

/// Reset a password with a previously issued token. Single-use: the token is
/// deleted on success, so a second call with the same token fails.
pub async fn reset_password(pool: &PgPool, token: &str, new_password: &str) -> ApiResult<()> {
    let digest = hash_opaque_token(token);
    let user_id = queries::find_reset_token_user(pool, &digest)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid or expired reset token".into()))?;

    let password_hash = password::hash_password(new_password)?;
    queries::update_password(pool, &user_id, &password_hash).await?;
    queries::delete_reset_token(pool, &user_id).await?;

    info!(user_id = %user_id, "password reset completed");
    Ok(())
}

/// Exchange a refresh token for a new access + refresh pair.
///
/// Rotation by convention: the old refresh token is superseded, not revoked.
/// It stays valid until its own expiry, so concurrent refreshes from the
/// same token each succeed independently.
pub async fn refresh(
    pool: &PgPool,
    config: &ApiConfig,
    refresh_token: &str,
) -> ApiResult<TokenPairData> {
    let claims = fleet_core::auth::jwt::verify_token(refresh_token, config.jwt_secret.as_bytes())
        .map_err(|_| ApiError::Unauthorized("Invalid refresh token".into()))?;

    // An access token must never pass the refresh flow, however valid.
    if claims.kind != TokenKind::Refresh {
        return Err(ApiError::Unauthorized("Invalid refresh token".into()));
    }

    let found = queries::find_user_by_id(pool, &claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    let (token, refresh_token) = issue_token_pair(&found.user.id, &found.user.email, config)?;
    Ok(TokenPairData {
        token,
        refresh_token,
    })
}

/// Change the password of an authenticated caller.
pub async fn change_password(
    pool: &PgPool,
    user_id: &str,
    current_password: &str,
    new_password: &str,
) -> ApiResult<()> {
    let found = queries::find_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if !password::verify_password(current_password, &found.password_hash)? {
        return Err(ApiError::BadRequest("Current password is incorrect".into()));
    }

    let password_hash = password::hash_password(new_password)?;
    queries::update_password(pool, user_id, &password_hash).await?;

    info!(user_id = %user_id, "password changed");
    Ok(())
}

/// Fetch the authenticated caller's profile.
pub async fn current_user(pool: &PgPool, auth: &AuthenticatedUser) -> ApiResult<AuthUser> {
    let found = queries::find_user_by_id(pool, &auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(AuthUser::from_user(&found.user, Some(auth.roles.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_tokens_are_long_and_alphanumeric() {
        let token = generate_reset_token();
        assert_eq!(64, token.len());
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn reset_tokens_are_unique() {
        assert_ne!(generate_reset_token(), generate_reset_token());
    }

    #[test]
    fn opaque_token_digest_is_stable_hex() {
        let a = hash_opaque_token("some-token");
        let b = hash_opaque_token("some-token");
        assert_eq!(a, b);
        assert_eq!(64, a.len());
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, hash_opaque_token("other-token"));
    }
}
