use std::net::SocketAddr;

use axum::{Router, routing::get, routing::post};
use tokio::net::TcpListener;
use tower_http::decompression::RequestDecompressionLayer;
use tracing::{error, info};

use super::{
    services::{analyze_niche, create_content, get_job, health, validate_analysis, validate_content},
    state::AppState,
};
use crate::config::Config;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All routes, with gzip/deflate/brotli request bodies decompressed
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/content", post(create_content))
        .route("/niche", post(analyze_niche))
        .route("/jobs/{kind}/{job_id}", get(get_job))
        .route("/validate/content", post(validate_content))
        .route("/validate/analysis", post(validate_analysis))
        .route("/health", get(health))
        .with_state(state)
        .layer(RequestDecompressionLayer::new())
}

/// Serve until Ctrl+C or SIGTERM. `address` overrides `server.bind_addr`.
pub async fn run(config: Config, address: Option<SocketAddr>) -> Result<(), AnyError> {
    let address = address.unwrap_or(config.server.bind_addr);

    let state = AppState::from_config(config)?;
    let tasks = state.router.start();
    info!(mode = ?state.router.mode(), tasks = tasks.len(), "Job router started");

    let listener = TcpListener::bind(address).await?;
    info!(%address, "postforge API listening");

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received");
}
