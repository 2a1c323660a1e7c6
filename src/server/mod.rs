//! HTTP server.
//!
//! REST API over the evaluation engine: dataset readiness, evaluation
//! runs, single-row prediction, and the stored-model listing.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use state::AppState;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::data::DEFAULT_DATA_PATH;
use crate::store::DEFAULT_MODELS_DIR;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_path: String,
    pub models_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            data_path: std::env::var("DATA_PATH").unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string()),
            models_dir: std::env::var("MODELS_DIR")
                .unwrap_or_else(|_| DEFAULT_MODELS_DIR.to_string()),
        }
    }
}

/// Start the server with the given configuration
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();

    let state = Arc::new(AppState::new(config.clone())?);

    // A missing dataset degrades the server instead of crashing it;
    // /api/startup reports the condition.
    match state.load_dataset().await {
        Ok(rows) => info!(rows, path = %config.data_path, "Dataset loaded"),
        Err(e) => warn!(
            path = %config.data_path,
            error = %e,
            "Dataset unavailable, starting degraded"
        ),
    }

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        host = %config.host,
        port = config.port,
        models_dir = %config.models_dir,
        started_at = %start_time.to_rfc3339(),
        "diabeval server starting"
    );
    info!(url = %format!("http://{}/api", addr), "REST API available");
    info!(url = %format!("http://{}/api/health", addr), "Health endpoint available");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening and ready to accept connections");

    // Graceful shutdown on ctrl+c
    let start_time_for_shutdown = start_time;
    let shutdown_signal = async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        let stop_time = chrono::Utc::now();
        let uptime = stop_time.signed_duration_since(start_time_for_shutdown);
        info!(
            stopped_at = %stop_time.to_rfc3339(),
            uptime_secs = uptime.num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    info!("Server started successfully (press ctrl+c to stop)");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
