// Ledger Pages - Web Server
// Serves the transaction ledger, the cat gallery and a small JSON API

use anyhow::{Context, Result};
use ledger_pages::{init_tracing, open_database, router, seed_if_empty, AppState, Config, LedgerStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    init_tracing(config.log_json);

    let store = match &config.db_path {
        Some(db_path) => {
            let conn = open_database(db_path)?;
            let seeded = seed_if_empty(&conn)?;
            tracing::info!(path = %db_path.display(), seeded, "using SQLite ledger store");
            LedgerStore::sqlite(conn)
        }
        None => {
            tracing::info!("using seeded ledger (rebuilt on every request)");
            LedgerStore::Seeded
        }
    };

    if !config.image_dir.is_dir() {
        tracing::warn!(dir = %config.image_dir.display(), "gallery directory not found; gallery will be empty");
    }

    let app = router(AppState {
        store,
        image_dir: config.image_dir.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    tracing::info!(addr = %config.bind_addr, "server running");
    tracing::info!("   Ledger:  http://{}/", config.bind_addr);
    tracing::info!("   Gallery: http://{}/gallery", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to start server")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
    }
}
