//! Auth-related database queries.
//!
//! Lookups used for authentication only see active users; soft-deleted rows
//! are invisible here.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::AuthError;
use crate::models::auth::{Role, User, UserWithPassword};

/// Full user row: id, email, first name, last name, active flag,
/// created/updated timestamps, password hash.
type UserRow = (
    String,
    String,
    String,
    String,
    bool,
    DateTime<Utc>,
    DateTime<Utc>,
    String,
);

const USER_COLUMNS: &str =
    "id::text, email, first_name, last_name, is_active, created_at, updated_at, password_hash";

fn map_user_row(row: UserRow) -> UserWithPassword {
    let (id, email, first_name, last_name, is_active, created_at, updated_at, password_hash) = row;
    UserWithPassword {
        user: User {
            id,
            email,
            first_name,
            last_name,
            is_active,
            created_at,
            updated_at,
        },
        password_hash,
    }
}

/// Fetch an active user by email (matched lowercased).
pub async fn find_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserWithPassword>, AuthError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND is_active");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(email.to_lowercase())
        .fetch_optional(pool)
        .await?;
    Ok(row.map(map_user_row))
}

/// Fetch an active user by ID.
pub async fn find_user_by_id(
    pool: &PgPool,
    user_id: &str,
) -> Result<Option<UserWithPassword>, AuthError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1::uuid AND is_active");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(map_user_row))
}

/// Create a new user. The email is stored lowercased.
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    first_name: &str,
    last_name: &str,
) -> Result<User, AuthError> {
    let sql = format!(
        "INSERT INTO users (email, password_hash, first_name, last_name) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {USER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(email.to_lowercase())
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(pool)
        .await?;
    Ok(map_user_row(row).user)
}

/// Update a user's password hash.
pub async fn update_password(
    pool: &PgPool,
    user_id: &str,
    password_hash: &str,
) -> Result<(), AuthError> {
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2::uuid")
        .bind(password_hash)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Fetch roles for a user. Read fresh on every authenticated request, so a
/// revocation takes effect on the caller's next request.
pub async fn get_user_roles(pool: &PgPool, user_id: &str) -> Result<Vec<Role>, AuthError> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT role::text FROM user_roles WHERE user_id = $1::uuid",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter()
        .map(|r| r.parse::<Role>().map_err(AuthError::Internal))
        .collect()
}

/// Grant a role to a user. Granting an already-held role is a no-op.
pub async fn assign_role(pool: &PgPool, user_id: &str, role: Role) -> Result<(), AuthError> {
    sqlx::query(
        "INSERT INTO user_roles (user_id, role) VALUES ($1::uuid, $2::user_role) \
         ON CONFLICT (user_id, role) DO NOTHING",
    )
    .bind(user_id)
    .bind(role.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

/// Revoke a role from a user.
pub async fn remove_role(pool: &PgPool, user_id: &str, role: Role) -> Result<(), AuthError> {
    sqlx::query("DELETE FROM user_roles WHERE user_id = $1::uuid AND role = $2::user_role")
        .bind(user_id)
        .bind(role.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

/// Check whether a user holds a role.
pub async fn has_role(pool: &PgPool, user_id: &str, role: Role) -> Result<bool, AuthError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM user_roles WHERE user_id = $1::uuid AND role = $2::user_role)",
    )
    .bind(user_id)
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Store a password reset token digest, replacing any prior token for the
/// user. At most one live reset token per user, enforced in one statement.
pub async fn upsert_reset_token(
    pool: &PgPool,
    user_id: &str,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), AuthError> {
    sqlx::query(
        "INSERT INTO password_reset_tokens (user_id, token_hash, expires_at) \
         VALUES ($1::uuid, $2, $3) \
         ON CONFLICT (user_id) DO UPDATE \
         SET token_hash = $2, expires_at = $3, created_at = now()",
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Resolve a reset token digest to a user ID, ignoring expired tokens.
pub async fn find_reset_token_user(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<String>, AuthError> {
    let row = sqlx::query_scalar::<_, String>(
        "SELECT user_id::text FROM password_reset_tokens \
         WHERE token_hash = $1 AND expires_at > now()",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Delete a user's reset token (consumed on successful reset).
pub async fn delete_reset_token(pool: &PgPool, user_id: &str) -> Result<(), AuthError> {
    sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = $1::uuid")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
