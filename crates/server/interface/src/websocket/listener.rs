//! Accept loop for WebSocket clients

use crate::websocket::handler::{WebSocketState, handle_websocket};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

/// Pause after a failed `accept` before trying again.
pub(crate) const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accept connections until `shutdown` flips or its sender is dropped.
///
/// Each accepted socket gets its own task for the handshake and session.
pub async fn serve_websocket(
    listener: TcpListener,
    state: WebSocketState,
    mut shutdown: watch::Receiver<bool>,
) {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "WebSocket listener running");
    }

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let state = state.clone();
                    tokio::spawn(async move {
                        match tokio_tungstenite::accept_async(stream).await {
                            Ok(ws_stream) => handle_websocket(ws_stream, state, peer).await,
                            Err(e) => warn!(%peer, error = %e, "WebSocket handshake failed"),
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            },
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("WebSocket listener stopping");
                    break;
                }
            }
        }
    }
}
