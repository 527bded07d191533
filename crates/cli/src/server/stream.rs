//! `GET /stream` - one stream broadcaster per connected client

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderValue};
use axum::response::Response;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use dispatcher::{Broadcaster, StreamRegistry};
use envelope::WireFormat;

use super::AppState;

/// Lines buffered per client before the broadcaster waits on the body
const STREAM_BUFFER: usize = 16;

pub async fn stream(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
) -> Response {
    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
    let registry = StreamRegistry::new(tx.clone()).with_id(remote.to_string());

    // Dropping the body closes the receiver; stop the loop right away
    let cancel = state.shutdown.child_token();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tx.closed() => watcher.cancel(),
            _ = watcher.cancelled() => {}
        }
    });

    info!(remote = %remote, "Stream client connected");

    let broadcaster = Broadcaster::new(
        "stream",
        Arc::clone(&state.source),
        registry,
        state.builder.clone(),
        WireFormat::Stream,
        state.config.http.stream_interval(),
    );
    tokio::spawn(async move {
        match broadcaster.run(cancel).await {
            Ok(stats) => info!(remote = %remote, ticks = stats.ticks, "Stream client disconnected"),
            Err(e) => warn!(remote = %remote, error = %e, "Stream client disconnected"),
        }
    });

    let mut response = Response::new(Body::from_stream(ReceiverStream::new(rx)));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/x-ndjson; charset=utf-8"),
    );
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}
