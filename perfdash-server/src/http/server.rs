//! Axum server setup
//!
//! Server skeleton with:
//! - Tracing middleware
//! - CORS layer
//! - Graceful shutdown on SIGTERM/Ctrl+C
//!
//! The HTML dashboard is mounted under the configured CUSTOM_LINK prefix;
//! the JSON API and health probe live at the root.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use perfdash_core::DashboardConfig;
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::routes;
use crate::db::migrations;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:5000)
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: DashboardConfig,
}

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // An empty CUSTOM_LINK would nest at "/", which axum rejects
    let link = state.config.link.trim_matches('/');
    let link = if link.is_empty() { "dashboard" } else { link };
    let link = format!("/{link}");

    Router::new()
        .merge(routes::health::router())
        .merge(routes::measurements::router())
        .merge(routes::rules::router())
        .nest(&link, routes::dashboard::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Run the HTTP server.
///
/// Runs migrations on the given pool, then serves until Ctrl+C or SIGTERM.
pub async fn run_server(
    pool: SqlitePool,
    config: DashboardConfig,
    server: ServerConfig,
) -> Result<(), ServerError> {
    migrations::run(&pool).await?;

    let link = config.link.clone();
    let app = build_router(AppState { pool, config });

    let listener = TcpListener::bind(server.bind_addr).await?;
    tracing::info!(
        "Dashboard listening on http://{}/{}/hourly_load",
        server.bind_addr,
        link
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
