//! `GET /health` - static plain-text self description

use axum::http::header;
use axum::response::IntoResponse;

pub const HEALTH_BODY: &str = "LocalSense Neuron Seller Shim\n\
Endpoints:\n  \
GET /status - one-shot status (config + Pi metrics + Pi health)\n  \
GET /stream - NDJSON stream of brightness samples\n";

pub async fn health() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        HEALTH_BODY,
    )
}
