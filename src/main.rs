//! platewatch - Plate Identity Resolution & Tracking Engine
//!
//! Resolves noisy OCR plate reads to canonical plate records, maintains a
//! blacklist with fuzzy propagation, and serves the query/analysis API.

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use platewatch::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting platewatch");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let cli_data_dir = std::env::args().nth(1);
    let data_dir = platewatch::config::resolve_data_dir(cli_data_dir.as_deref());
    std::fs::create_dir_all(&data_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create data directory: {}", e))?;

    let db_path = platewatch::config::database_path(&data_dir);
    info!("Database: {}", db_path.display());

    let db_pool = platewatch::db::init_database_pool(&db_path).await?;
    platewatch::db::init_tables(&db_pool).await?;
    info!("Database connection established");

    let state = AppState::new(db_pool);
    let app = platewatch::build_router(state);

    let port = platewatch::config::resolve_port();
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
