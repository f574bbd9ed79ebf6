//! PostgreSQL connection pool lifecycle.
//!
//! The pool is built once at process start and handed to the layers that
//! need it; nothing in this workspace reaches for a global connection.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

/// Default pool size.
const DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// How long a request may wait for a connection from the pool.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Pool settings.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
}

impl PoolSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

/// Open a connection pool with the given settings.
pub async fn connect(settings: &PoolSettings) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&settings.url)
        .await?;
    info!(max_connections = settings.max_connections, "database pool ready");
    Ok(pool)
}

/// Close the pool, waiting for in-flight connections to finish.
pub async fn shutdown(pool: &PgPool) {
    pool.close().await;
    info!("database pool closed");
}
