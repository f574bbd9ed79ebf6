//! Fleet platform auth API server binary.

use clap::Parser;
use tracing::info;

use fleet_api::config::ApiConfig;
use fleet_core::db::PoolSettings;

/// CLI arguments for the auth API server.
#[derive(Parser, Debug)]
#[command(name = "fleet_api_server", about = "Fleet platform auth API server")]
struct Args {
    /// Address to bind the HTTP listener.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3001")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/fleet"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 20)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fleet_api=debug,fleet_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    info!(database_url = %args.database_url, bind_addr = %args.bind_addr, "starting fleet_api_server");

    let mut settings = PoolSettings::new(&args.database_url);
    settings.max_connections = args.max_connections;
    let pool = fleet_core::db::connect(&settings).await?;

    info!("running database migrations");
    fleet_core::migrate::migrate(&pool).await?;

    let config = ApiConfig {
        bind_addr: args.bind_addr,
        database_url: args.database_url,
        ..ApiConfig::from_env()
    };

    let state = fleet_api::AppState {
        pool: pool.clone(),
        config: config.clone(),
    };

    let app = fleet_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    fleet_core::db::shutdown(&pool).await;

    Ok(())
}

/// Resolves when the process receives ctrl-c.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
