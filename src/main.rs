use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tastept::core::{AppState, Config};
use tastept::{create_router, monitoring};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging strutturato, filtrabile con RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Carica la configurazione dalle variabili d'ambiente
    let config = Config::from_env()?;
    config.print_info();

    // Pool di connessioni MySQL
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .max_lifetime(Duration::from_secs(config.connection_lifetime_secs))
        .connect(&config.database_url)
        .await?;

    info!("Database pool ready");

    let addr = format!("{}:{}", config.server_host, config.server_port);

    let state = Arc::new(AppState::new(pool, config));
    let app = create_router(state);

    // Campionamento periodico di CPU/memoria del processo
    monitoring::spawn_process_monitor(monitoring::DEFAULT_INTERVAL_SECS);

    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
