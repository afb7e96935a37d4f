//! Application startup and server initialization.
//!
//! This module handles the creation and configuration of the HTTP server,
//! including initialization of the metrics registry, the transaction store,
//! the connection-pool sampler and route setup.

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::config::Config;
use crate::metrics::{spawn_pool_sampler, Metrics};
use crate::routes;
use crate::state::AppState;
use crate::store::create_store;

/// Initializes and runs the application server.
///
/// Builds the metrics registry and the store, binds the configured address
/// and serves until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns an error if the store cannot be reached or initialized, or if the
/// server fails to bind to the configured address.
pub async fn run(config: Arc<Config>) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = Metrics::new();
    let store = create_store(&config).await?;

    let bind_address = config.bind_address();
    let listener = TcpListener::bind(&bind_address).await?;
    info!("Server starting on {}", bind_address);

    let state = AppState {
        config,
        store,
        metrics,
    };
    serve(state, listener, shutdown_signal()).await
}

/// Starts the pool sampler and serves HTTP on `listener` until `shutdown`
/// resolves. Once in-flight requests have drained, the sampler is told to
/// stop and awaited before returning.
pub async fn serve<F>(
    state: AppState,
    listener: TcpListener,
    shutdown: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sampler = spawn_pool_sampler(
        state.store.clone(),
        state.metrics.clone(),
        state.config.sampler.interval(),
        shutdown_rx,
    );

    let app = routes::create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    // The receiver treats a closed channel as shutdown too, so a failed send
    // still stops the sampler.
    let _ = shutdown_tx.send(true);
    sampler.await?;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
    info!("Signal received, starting graceful shutdown");
}
