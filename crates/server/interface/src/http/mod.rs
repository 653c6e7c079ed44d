//! HTTP surface: liveness and Prometheus exposition

pub mod health;
pub mod metrics;

use axum::Router;
use parlor_server_infrastructure::PresenceRelay;
use std::sync::Arc;

pub use health::{HealthResponse, health_router};
pub use metrics::metrics_router;

/// Router serving `/health` and `/metrics`
pub fn http_router(relay: Arc<PresenceRelay>, registry: Arc<prometheus::Registry>) -> Router {
    Router::new()
        .merge(health_router(relay))
        .merge(metrics_router(registry))
}
