pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod models;
pub mod routes;
pub mod state;
pub mod stats;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use config::Config;
use error::Result;
use state::AppState;

pub async fn run(config: Config) -> Result<()> {
    let port = config.port;

    info!("Initializing state...");
    let state = AppState::new(config).await?;

    let app = routes::router(state);

    let address = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
