//! Startup module - orchestrates application initialization.

pub mod shutdown;

use anyhow::Context;
use parlor_server_infrastructure::{PresenceRelay, RealtimeMetrics};
use parlor_server_interface::{WebSocketState, http_router, serve_websocket};
use parlor_shared::config::RelayConfigDto;
use shutdown::{GracefulShutdown, ShutdownConfig, start_signal_handler};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Current application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application state containing all initialized components.
#[derive(Debug, Clone)]
pub struct AppState {
    pub relay: Arc<PresenceRelay>,
    /// Prometheus registry served at `/metrics`
    pub registry: Arc<prometheus::Registry>,
}

impl AppState {
    pub fn new(config: &RelayConfigDto) -> anyhow::Result<Self> {
        let metrics = RealtimeMetrics::new().context("Failed to create relay metrics")?;
        let registry = prometheus::Registry::new();
        metrics
            .register(&registry)
            .context("Failed to register relay metrics")?;

        Ok(Self {
            relay: Arc::new(PresenceRelay::new(
                config.relay.transcript_capacity,
                metrics,
            )),
            registry: Arc::new(registry),
        })
    }
}

/// Both listeners, bound and serving
#[derive(Debug)]
pub struct RunningServer {
    pub ws_addr: SocketAddr,
    pub http_addr: SocketAddr,
    ws_task: JoinHandle<()>,
    http_task: JoinHandle<std::io::Result<()>>,
}

impl RunningServer {
    /// Wait for both listeners to stop after the shutdown flag flipped.
    pub async fn drain(self, shutdown: &GracefulShutdown) -> anyhow::Result<()> {
        let limit = shutdown.config().timeout;
        let drained = tokio::time::timeout(limit, async {
            let ws = self.ws_task.await;
            let http = self.http_task.await;
            (ws, http)
        })
        .await;

        match drained {
            Ok((ws, http)) => {
                ws.context("WebSocket listener task failed")?;
                http.context("HTTP listener task failed")?
                    .context("HTTP server error")?;
                shutdown.complete();
                info!("✓ Listeners drained");
                Ok(())
            }
            Err(_) => {
                warn!(timeout = ?limit, "Listeners did not stop in time");
                Ok(())
            }
        }
    }
}

/// Bind both listeners and start serving.
pub async fn start(
    config: &RelayConfigDto,
    state: &AppState,
    shutdown: &GracefulShutdown,
) -> anyhow::Result<RunningServer> {
    let ws_listener = TcpListener::bind(config.server.ws_bind)
        .await
        .with_context(|| format!("Failed to bind WebSocket listener on {}", config.server.ws_bind))?;
    let ws_addr = ws_listener.local_addr()?;

    let http_listener = TcpListener::bind(config.server.http_bind)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {}", config.server.http_bind))?;
    let http_addr = http_listener.local_addr()?;

    let ws_state = WebSocketState::new(state.relay.clone(), config.relay.outbound_capacity);
    let ws_task = tokio::spawn(serve_websocket(ws_listener, ws_state, shutdown.subscribe()));
    info!("✓ WebSocket listener on {}", ws_addr);

    let router = http_router(state.relay.clone(), state.registry.clone());
    let mut http_stop = shutdown.subscribe();
    let http_task = tokio::spawn(async move {
        axum::serve(http_listener, router)
            .with_graceful_shutdown(async move {
                let _ = http_stop.wait_for(|stop| *stop).await;
            })
            .await
    });
    info!("✓ HTTP listener on {}", http_addr);

    Ok(RunningServer {
        ws_addr,
        http_addr,
        ws_task,
        http_task,
    })
}

/// Run the relay until SIGINT/SIGTERM.
pub async fn run(config: RelayConfigDto) -> anyhow::Result<()> {
    info!(
        "Starting Parlor relay v{} (ws {}, http {})",
        APP_VERSION, config.server.ws_bind, config.server.http_bind
    );

    let shutdown = GracefulShutdown::new(ShutdownConfig::default());
    start_signal_handler(&shutdown);

    let state = AppState::new(&config)?;
    info!(
        transcript_capacity = ?config.relay.transcript_capacity,
        outbound_capacity = config.relay.outbound_capacity,
        "✓ Relay initialized"
    );

    let server = start(&config, &state, &shutdown).await?;

    let reason = shutdown.wait_for_signal().await;
    info!(%reason, "Shutting down gracefully...");

    server.drain(&shutdown).await
}
