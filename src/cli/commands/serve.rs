//! Serve command implementation

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cli::error::CliError;
use crate::config::AppConfig;
use crate::ingest::{IngestionTrigger, RawWatcher};
use crate::server::{self, AppState};

/// Handle the `serve` command: HTTP endpoints plus the optional raw-container watcher
pub async fn handle_serve(config: &AppConfig) -> Result<(), CliError> {
    let store = config.storage.open()?;
    info!(backend = ?config.storage.backend, "Opened blob store");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let watcher = if config.watch.enabled {
        let trigger = Arc::new(IngestionTrigger::new(
            store.clone(),
            config.containers.outputs.clone(),
        ));
        let watcher = RawWatcher::new(
            store.clone(),
            config.containers.raw.clone(),
            trigger,
            Duration::from_secs(config.watch.interval_secs),
        );
        let mut rx = shutdown_rx.clone();
        Some(tokio::spawn(watcher.run_until(async move {
            // A dropped sender also means shutdown
            let _ = rx.wait_for(|stop| *stop).await;
        })))
    } else {
        None
    };

    let address = config.server.address();
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| CliError::Server(format!("Failed to bind {address}: {e}")))?;

    let state = AppState::new(store, config);
    let result = server::serve(listener, state, async move {
        server::shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    })
    .await;

    drop(shutdown_rx);
    if let Some(handle) = watcher {
        await_watcher(handle).await;
    }

    result.map_err(|e| CliError::Server(e.to_string()))
}

/// Wait for the watcher task to finish; returns false if it panicked or was cancelled
async fn await_watcher(handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Raw container watcher task failed");
            false
        }
    }
}
