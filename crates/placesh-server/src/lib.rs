pub mod api;
pub mod canvas;
pub mod config;
pub mod error;
pub mod live;
pub mod persistence;

use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::canvas::SharedCanvas;
use crate::config::Config;
use crate::persistence::PersistenceManager;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub canvas: Arc<SharedCanvas>,
}

/// Build the router for the given state
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(api::router())
        .merge(live::router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve the app on `listener` until `shutdown` completes.
///
/// Handlers see the peer address, which keys the placement cooldown.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

/// Run the server with the given configuration
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let persistence = PersistenceManager::new(&config.snapshot_path, config.snapshot_interval);

    // Restore must finish before any client is served
    let store = persistence.restore().await;
    let canvas = Arc::new(SharedCanvas::new(store, config.place_cooldown));

    // Start the snapshot timer
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let snapshots = tokio::spawn(persistence.run(Arc::clone(&canvas), shutdown_rx));

    // Create application state
    let state = AppState {
        canvas: Arc::clone(&canvas),
    };

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(
        cooldown_ms = config.place_cooldown.as_millis() as u64,
        snapshot_secs = config.snapshot_interval.as_secs(),
        "Server listening on {}",
        addr
    );

    let served = serve(listener, state, shutdown_signal()).await;

    // Upgraded live sessions outlive the listener, so stop them placing
    // before the last snapshot is taken
    canvas.close().await;

    // Stop the timer and flush one last snapshot, even if serving failed
    let _ = shutdown_tx.send(true);
    if let Err(e) = snapshots.await {
        tracing::error!("Snapshot task failed: {}", e);
    }

    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
