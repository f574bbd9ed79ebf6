//! # fleet_api
//!
//! HTTP auth API for the fleet platform.

pub mod authorizer;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod services;
pub mod validation;

use axum::Router;
use axum::routing::{get, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::auth;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required; for refresh, the token in the body is
    // the credential)
    let public = Router::new()
        .route("/api/v1/auth/signup", post(auth::signup_handler))
        .route("/api/v1/auth/login", post(auth::login_handler))
        .route(
            "/api/v1/auth/forgot-password",
            post(auth::forgot_password_handler),
        )
        .route(
            "/api/v1/auth/reset-password",
            post(auth::reset_password_handler),
        )
        .route("/api/v1/auth/refresh", post(auth::refresh_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route("/api/v1/auth/logout", post(auth::logout_handler))
        .route("/api/v1/auth/me", get(auth::current_user_handler))
        .route(
            "/api/v1/auth/change-password",
            post(auth::change_password_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
