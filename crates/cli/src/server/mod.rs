//! HTTP surface: `/health`, `/status` and the NDJSON `/stream`

mod health;
mod status;
mod stream;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use contracts::NodeConfig;
use envelope::EnvelopeBuilder;
use ingestion::HttpSensorSource;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<NodeConfig>,
    pub source: Arc<HttpSensorSource>,
    pub builder: EnvelopeBuilder,
    /// Parent of every per-client stream token
    pub shutdown: CancellationToken,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/status", get(status::status))
        .route("/stream", get(stream::stream))
        .with_state(state)
}

/// Serve until `shutdown` is cancelled
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let shutdown = state.shutdown.clone();
    let app = router(state);

    if let Ok(addr) = listener.local_addr() {
        info!(bind = %addr, "HTTP surface listening");
    }

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await?;

    info!("HTTP surface stopped");
    Ok(())
}
