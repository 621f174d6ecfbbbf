//! Karaoke Studio - sing over a backing track, get a shareable video.
//!
//! This is the main library crate for the Karaoke Studio backend.
//! It provides the HTTP server setup and all backend functionality.

pub mod api;
pub mod config;
pub mod media;
pub mod notify;
pub mod storage;
pub mod template;
pub mod utils;

use anyhow::Context;
use api::AppState;
use config::AppConfig;
use media::Muxer;
use std::future::Future;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utils::{AppError, AppResult};

/// Initialize logging and run the server until Ctrl-C or SIGTERM
pub async fn run() -> anyhow::Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "karaoke_studio_lib=debug,karaoke_studio=debug,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Karaoke Studio v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load().context("Invalid configuration")?;
    tracing::debug!("Configuration: {:?}", config);

    serve(config, shutdown_signal()).await?;
    Ok(())
}

/// Build every service from `config` and serve HTTP until `shutdown` resolves
pub async fn serve<F>(config: AppConfig, shutdown: F) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let store = storage::connect(&config.storage).await;
    let notifier = notify::connect(config.smtp.as_ref()).await?;

    let muxer = Arc::new(Muxer::new(&config.media));
    if let Err(e) = muxer.init().await {
        // Uploads still work; composition retries the engine on next use
        tracing::warn!("Transcoding engine not available yet: {}", e);
    }

    let state = AppState::new(store, notifier.clone(), muxer);
    let app = api::router(state, config.server.max_upload_bytes);

    let bind_addr = config.server.bind_addr;
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Server(format!("Failed to bind {}: {}", bind_addr, e)))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Server stopped, releasing resources");
    notifier.shutdown().await;
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
