//! Liveness endpoint reporting relay occupancy

use axum::{Json, Router, extract::State, routing::get};
use parlor_server_infrastructure::PresenceRelay;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub sessions: usize,
    pub transcript_len: usize,
}

pub fn health_router(relay: Arc<PresenceRelay>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(relay)
}

async fn health_handler(State(relay): State<Arc<PresenceRelay>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        sessions: relay.session_count().await,
        transcript_len: relay.transcript_len().await,
    })
}
