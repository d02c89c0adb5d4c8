//! VisionCop Server - REST API for image similarity search and verification
//!
//! Endpoints:
//! - POST /index   - Store and index images
//! - POST /search  - Find similar indexed images, optionally verifying them
//! - POST /verify  - Verify a query image against candidates
//! - POST /analyze - Fingerprint and manipulation report for one image
//! - GET  /images/{filename}, /status, /health, /ready, /docs

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;
use visioncop_server::{create_router_with_config, Config};

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("visioncop_core=info,visioncop_server=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();
    let addr = config.socket_addr();

    let app = match create_router_with_config(&config) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialise application state");
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(
        %addr,
        data_dir = %config.data_dir.display(),
        index = ?config.index_path,
        "VisionCop server listening (API docs at /docs)"
    );

    // Peer addresses are needed by the rate limiter's key extractor
    let result = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    if let Err(e) = result {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
