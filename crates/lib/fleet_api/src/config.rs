//! API server configuration.

use chrono::Duration;
use tracing::warn;

use fleet_core::auth::jwt::resolve_jwt_secret;

/// Default access token lifetime.
const DEFAULT_ACCESS_TTL: &str = "24h";

/// Default refresh token lifetime.
const DEFAULT_REFRESH_TTL: &str = "7d";

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3001").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Access token lifetime.
    pub access_token_ttl: Duration,
    /// Refresh token lifetime.
    pub refresh_token_ttl: Duration,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                 | Default                               |
    /// |--------------------------|---------------------------------------|
    /// | `BIND_ADDR`              | `127.0.0.1:3001`                      |
    /// | `DATABASE_URL`           | `postgres://localhost:5432/fleet`     |
    /// | `JWT_SECRET`             | generated & persisted to file         |
    /// | `JWT_EXPIRES_IN`         | `24h`                                 |
    /// | `JWT_REFRESH_EXPIRES_IN` | `7d`                                  |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3001".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/fleet".into()),
            jwt_secret: resolve_jwt_secret(),
            access_token_ttl: ttl_from_env("JWT_EXPIRES_IN", DEFAULT_ACCESS_TTL),
            refresh_token_ttl: ttl_from_env("JWT_REFRESH_EXPIRES_IN", DEFAULT_REFRESH_TTL),
        }
    }
}

/// Read a TTL duration string (e.g. "24h", "7d") from the environment,
/// falling back to the default on absence or a malformed value.
fn ttl_from_env(var: &str, default: &str) -> Duration {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    match parse_ttl(&raw) {
        Ok(ttl) => ttl,
        Err(e) => {
            warn!(var, value = %raw, error = %e, "malformed TTL, using default");
            parse_ttl(default).expect("default TTL parses")
        }
    }
}

/// Parse a human-readable duration string into a `chrono::Duration`.
pub fn parse_ttl(s: &str) -> Result<Duration, String> {
    let std = humantime::parse_duration(s).map_err(|e| e.to_string())?;
    Duration::from_std(std).map_err(|e| e.to_string())
}
