//! Authentication request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::response::ApiResponse;
use crate::services::auth::{self, FORGOT_PASSWORD_MESSAGE, SessionData, TokenPairData};
use crate::validation::{MIN_PASSWORD_LEN, require_email, require_min_len, require_non_empty};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// `POST /api/v1/auth/signup` — register a new user.
pub async fn signup_handler(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SessionData>>)> {
    let mut errors = Vec::new();
    require_email(&mut errors, "email", &body.email);
    require_min_len(&mut errors, "password", &body.password, MIN_PASSWORD_LEN);
    require_non_empty(&mut errors, "firstName", &body.first_name);
    require_non_empty(&mut errors, "lastName", &body.last_name);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let data = auth::signup(
        &state.pool,
        &state.config,
        &body.email,
        &body.password,
        &body.first_name,
        &body.last_name,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(data, "User registered successfully")),
    ))
}

/// `POST /api/v1/auth/login` — authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<SessionData>>> {
    let mut errors = Vec::new();
    require_email(&mut errors, "email", &body.email);
    require_non_empty(&mut errors, "password", &body.password);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let data = auth::login(&state.pool, &state.config, &body.email, &body.password).await?;
    Ok(Json(ApiResponse::success(data, "Login successful")))
}

/// `POST /api/v1/auth/logout` — requires authentication.
///
/// Stateless: there is no server-side token invalidation, the client simply
/// discards its tokens.
pub async fn logout_handler() -> Json<ApiResponse<()>> {
    Json(ApiResponse::message_only("Logout successful"))
}

/// `POST /api/v1/auth/forgot-password` — request a password reset.
///
/// Always answers with the same generic message so the endpoint cannot be
/// used to probe which emails have accounts.
pub async fn forgot_password_handler(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let mut errors = Vec::new();
    require_email(&mut errors, "email", &body.email);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    // The token, when one was issued, goes to the delivery channel, never
    // into this response.
    let _token = auth::forgot_password(&state.pool, &body.email).await?;
    Ok(Json(ApiResponse::message_only(FORGOT_PASSWORD_MESSAGE)))
}

/// `POST /api/v1/auth/reset-password` — set a new password with a reset token.
pub async fn reset_password_handler(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let mut errors = Vec::new();
    require_non_empty(&mut errors, "token", &body.token);
    require_min_len(&mut errors, "password", &body.password, MIN_PASSWORD_LEN);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    auth::reset_password(&state.pool, &body.token, &body.password).await?;
    Ok(Json(ApiResponse::message_only("Password reset successful")))
}

/// `POST /api/v1/auth/refresh` — exchange a refresh token for a new pair.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> ApiResult<Json<ApiResponse<TokenPairData>>> {
    if body.refresh_token.is_empty() {
        return Err(ApiError::BadRequest("Refresh token is required".into()));
    }

    let data = auth::refresh(&state.pool, &state.config, &body.refresh_token).await?;
    Ok(Json(ApiResponse::success(
        data,
        "Token refreshed successfully",
    )))
}

/// `GET /api/v1/auth/me` — current authenticated user.
pub async fn current_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<ApiResponse<auth::AuthUser>>> {
    let data = auth::current_user(&state.pool, &user).await?;
    Ok(Json(ApiResponse::success(data, "Success")))
}

/// `POST /api/v1/auth/change-password` — requires authentication.
pub async fn change_password_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let mut errors = Vec::new();
    require_non_empty(&mut errors, "currentPassword", &body.current_password);
    require_min_len(
        &mut errors,
        "newPassword",
        &body.new_password,
        MIN_PASSWORD_LEN,
    );
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    auth::change_password(
        &state.pool,
        &user.id,
        &body.current_password,
        &body.new_password,
    )
    .await?;
    Ok(Json(ApiResponse::message_only(
        "Password changed successfully",
    )))
}
