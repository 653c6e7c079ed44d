//! HTTP handler for Prometheus metrics exposition

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;

/// Metrics state for the HTTP server
#[derive(Clone)]
pub struct MetricsState {
    pub registry: Arc<prometheus::Registry>,
}

/// Create the metrics router
pub fn metrics_router(registry: Arc<prometheus::Registry>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(MetricsState { registry })
}

async fn metrics_handler(
    State(state): State<MetricsState>,
) -> Result<Response, (axum::http::StatusCode, String)> {
    let encoder = TextEncoder::new();
    let metric_families = state.registry.gather();

    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| (axum::http::StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let response = String::from_utf8(buffer)
        .map_err(|e| (axum::http::StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok((
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        response,
    )
        .into_response())
}
