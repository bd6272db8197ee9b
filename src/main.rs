use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use warbler::config::{Cli, Config};
use warbler::state::AppState;
use warbler::{db, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    let db_path = config
        .db_path()
        .ok_or_else(|| anyhow::anyhow!("No database path configured"))?
        .to_path_buf();
    tracing::info!("Database: {}", db_path.display());

    // Initialize database
    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = routes::app(AppState::new(pool, config));

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
