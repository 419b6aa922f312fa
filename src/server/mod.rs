//! HTTP surface over the cached artifacts
//!
//! - `GET /raw`: the cleaned dataset CSV, verbatim
//! - `GET /page`: filtered, paginated rows as JSON
//! - `GET /stats`: filtering statistics and the chart manifest (any origin)

pub mod error;
pub mod routes;
pub mod state;

use std::future::Future;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

pub use error::ApiError;
pub use state::AppState;

use routes::{page_handler, raw_handler, stats_handler};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/raw", get(raw_handler))
        .route("/page", get(page_handler))
        .route("/stats", get(stats_handler).layer(CorsLayer::permissive()))
        .with_state(state)
}

/// Serve `state` on `listener` until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(address) = listener.local_addr() {
        info!("Server running on {address}");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shut down");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
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
}
