//! vt-server: the vitrine HTTP API.
//!
//! Catalog CRUD and image upload sit behind bearer-token auth. Originals and
//! derivatives are served publicly. [`start`] wires config, database and
//! image pipeline together and serves until a shutdown signal.

pub mod context;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod token;

use std::net::SocketAddr;
use std::path::Path;

use vt_core::config::Config;
use vt_core::Error;
use vt_db::pool::DbPool;

use crate::context::AppContext;

/// Run the server until SIGINT or SIGTERM.
pub async fn start(config: Config) -> vt_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config: {warning}");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| Error::Internal(format!("invalid listen address: {e}")))?;

    let db = open_database(&config.server.db_path)?;
    let ctx = AppContext::new(db, config);

    let images = ctx.images.store();
    images.ensure_dir().await?;
    tracing::info!(
        dir = %images.root().display(),
        max_upload_bytes = ctx.config.images.max_upload_bytes,
        transform_workers = ctx.config.images.max_concurrent_transforms.max(1),
        "Image store ready"
    );

    let app = router::build_router(ctx);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Internal(format!("cannot bind {addr}: {e}")))?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Internal(format!("server error: {e}")))?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Open the database file, creating its directory on first run.
pub fn open_database(path: &Path) -> vt_core::Result<DbPool> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let fresh = !path.exists();
    let db = vt_db::pool::init_pool(&path.to_string_lossy())?;
    tracing::info!(path = %path.display(), fresh, "Database open");
    Ok(db)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutting down");
}
