//! vogel-server: HTTP API for species, observations and images.
//!
//! Provides the Axum router, the edit-key guard, the image upload and
//! resize-and-cache pipeline, and graceful shutdown via signal handling.

pub mod context;
pub mod error;
pub mod images;
pub mod middleware;
pub mod router;
pub mod routes;

use std::net::SocketAddr;

use vogel_core::config::Config;
use vogel_store::JsonStore;

use crate::context::AppContext;

/// Start the vogelvortrag server.
///
/// Opens the data file, prepares the upload and cache directories, and
/// serves HTTP until Ctrl+C or SIGTERM.
pub async fn start(config: Config) -> vogel_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let store = JsonStore::open(&config.storage.data_file)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| vogel_core::Error::Internal(format!("Invalid server address: {e}")))?;
    let static_dir = config.server.static_dir.clone();

    let ctx = AppContext::new(config, store);
    ctx.images.ensure_dirs()?;
    tracing::info!(
        uploads = %ctx.images.upload_dir().display(),
        cache = %ctx.images.cache_dir().display(),
        "Image directories ready"
    );

    let app = router::build_router(ctx, static_dir);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| vogel_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Starting server on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| vogel_core::Error::Internal(format!("Server error: {e}")))?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
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
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
