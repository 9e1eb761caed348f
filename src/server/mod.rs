//! HTTP surface for the ordering API
//!
//! This module wires transport concerns only: routing, request tracing,
//! CORS and graceful shutdown. Everything with domain meaning happens in
//! [`crate::orders::OrderService`]; the handlers in [`routes`] extract,
//! delegate and serialize.

mod routes;

pub use routes::{AppState, CreateOrderResponse, build_router};

use anyhow::Result;
use tokio::net::TcpListener;

/// Serve the API with graceful shutdown
///
/// This will:
/// - Bind to the provided address
/// - Start serving requests
/// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
///
/// # Example
///
/// ```ignore
/// let state = AppState { orders };
/// server::serve(state, "127.0.0.1:3000").await?;
/// ```
pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let app = routes::build_router(state);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
