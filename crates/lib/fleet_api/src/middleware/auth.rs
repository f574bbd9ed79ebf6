//! Authentication middleware — Bearer token extraction, JWT verification,
//! and role gates.
//!
//! Roles are loaded fresh from the store on every request, so a revocation
//! takes effect on the caller's next request, not instantly mid-session.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use fleet_core::auth::jwt::{TokenError, verify_token};
use fleet_core::auth::queries;
use fleet_core::models::auth::Role;

use crate::AppState;
use crate::error::ApiError;

/// Identity attached to request extensions once authentication succeeds.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: String,
    pub email: String,
    pub roles: Vec<Role>,
}

/// Axum middleware: extracts `Authorization: Bearer <token>`, verifies the
/// JWT, loads the caller's roles, and injects [`AuthenticatedUser`].
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, request.headers()).await?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Variant that never rejects: on any failure the request proceeds
/// anonymously, with no identity attached.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
        }
        Err(e) => debug!(error = %e, "optional auth: continuing anonymously"),
    }
    next.run(request).await
}

/// Role gate: requires an identity already attached by [`require_auth`] and
/// a non-empty intersection with `allowed`. Flat set membership, no
/// hierarchy: admin passes only where explicitly listed.
pub async fn require_roles(
    allowed: &'static [Role],
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".into()))?;

    if !has_any_role(&user.roles, allowed) {
        let required = allowed
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ApiError::Forbidden(format!(
            "Access denied. Required roles: {required}"
        )));
    }

    Ok(next.run(request).await)
}

async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AuthenticatedUser, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("No authorization header provided".into()))?;

    let token = extract_bearer(header)
        .ok_or_else(|| ApiError::Unauthorized("Invalid authorization header format".into()))?;

    let claims =
        verify_token(token, state.config.jwt_secret.as_bytes()).map_err(|e| match e {
            TokenError::Expired => ApiError::Unauthorized("Token has expired".into()),
            TokenError::Malformed => ApiError::Unauthorized("Invalid token".into()),
            TokenError::Unknown => ApiError::Unauthorized("Authentication failed".into()),
        })?;

    let roles = queries::get_user_roles(&state.pool, &claims.sub)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "role lookup failed during authentication");
            ApiError::Unauthorized("Authentication failed".into())
        })?;

    Ok(AuthenticatedUser {
        id: claims.sub,
        email: claims.email,
        roles,
    })
}

/// Strict header parse: exactly two space-separated parts with a
/// case-sensitive `Bearer` scheme.
fn extract_bearer(header: &str) -> Option<&str> {
    let parts: Vec<&str> = header.split(' ').collect();
    if parts.len() != 2 || parts[0] != "Bearer" {
        return None;
    }
    Some(parts[1])
}

/// Non-empty intersection between held and allowed role sets.
pub fn has_any_role(held: &[Role], allowed: &[Role]) -> bool {
    held.iter().any(|role| allowed.contains(role))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_parses() {
        assert_eq!(Some("abc.def.ghi"), extract_bearer("Bearer abc.def.ghi"));
    }

    #[test]
    fn scheme_is_case_sensitive() {
        assert_eq!(None, extract_bearer("bearer abc"));
        assert_eq!(None, extract_bearer("BEARER abc"));
    }

    #[test]
    fn wrong_shape_is_rejected() {
        assert_eq!(None, extract_bearer("Bearer"));
        assert_eq!(None, extract_bearer("Bearer a b"));
        assert_eq!(None, extract_bearer("Basic abc"));
        assert_eq!(None, extract_bearer(""));
    }

    #[test]
    fn viewer_only_fails_admin_gate() {
        assert!(!has_any_role(&[Role::Viewer], &[Role::Admin]));
    }

    #[test]
    fn viewer_with_admin_passes_admin_gate() {
        assert!(has_any_role(&[Role::Viewer, Role::Admin], &[Role::Admin]));
    }

    #[test]
    fn admin_does_not_satisfy_manager_gate_implicitly() {
        assert!(!has_any_role(&[Role::Admin], &[Role::Manager]));
    }

    #[test]
    fn empty_role_set_fails_every_gate() {
        assert!(!has_any_role(&[], &[Role::Viewer]));
    }
}
