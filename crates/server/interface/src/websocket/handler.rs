//! WebSocket Handler Implementation
//!
//! Bridges one WebSocket connection to the relay lifecycle events.

use futures::SinkExt;
use futures::stream::StreamExt;
use parlor_server_infrastructure::realtime::{Outbound, PresenceRelay};
use parlor_shared::realtime::{ClientCommand, ServerMessage};
use parlor_shared::{ConnectionId, RelayError};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Shared state for WebSocket connections
#[derive(Debug, Clone)]
pub struct WebSocketState {
    relay: Arc<PresenceRelay>,
    /// Capacity of each connection's outbound queue
    outbound_capacity: usize,
}

impl WebSocketState {
    pub fn new(relay: Arc<PresenceRelay>, outbound_capacity: usize) -> Self {
        Self {
            relay,
            outbound_capacity: outbound_capacity.max(1),
        }
    }

    pub fn relay(&self) -> &Arc<PresenceRelay> {
        &self.relay
    }
}

/// WebSocket error types
#[derive(Debug, Error, PartialEq)]
pub enum WsHandlerError {
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

impl WsHandlerError {
    pub fn code(&self) -> &'static str {
        match self {
            WsHandlerError::InvalidCommand(_) => "invalid_command",
            WsHandlerError::Relay(e) => e.code(),
        }
    }
}

/// Handle one WebSocket connection until the client leaves
///
/// The writer task owns the socket sink and drains the outbound queue, so
/// relay deliveries never wait on the network. When the reader ends (close
/// frame, socket error) or the writer fails, the connection is reported
/// disconnected exactly once.
#[tracing::instrument(skip(ws_stream, state))]
pub async fn handle_websocket<S>(
    ws_stream: tokio_tungstenite::WebSocketStream<S>,
    state: WebSocketState,
    peer: SocketAddr,
) where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    let start_time = Instant::now();
    // One extra slot backs the history replay reserved by the relay.
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(state.outbound_capacity + 1);

    let connection_id = state.relay.on_connect(outbound_tx.clone()).await;
    info!(connection_id = %connection_id, "WebSocket connection established");

    send_direct(
        &outbound_tx,
        &ServerMessage::Ack {
            id: format!("conn-{}", connection_id),
            status: "connected".to_string(),
        },
    );

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    let writer_id = connection_id.clone();
    let mut writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if let Err(e) = ws_tx.send(Message::Text(frame.into())).await {
                debug!(connection_id = %writer_id, error = %e, "Failed to write frame");
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    let reader = async {
        while let Some(result) = ws_rx.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    if let Err(e) = handle_client_message(
                        &state,
                        &connection_id,
                        &outbound_tx,
                        text.as_str(),
                    )
                    .await
                    {
                        warn!(connection_id = %connection_id, error = %e, "Rejected client frame");
                        send_direct(
                            &outbound_tx,
                            &ServerMessage::Error {
                                code: e.code().to_string(),
                                msg: e.to_string(),
                            },
                        );
                    }
                }
                Ok(Message::Close(_)) => {
                    info!(connection_id = %connection_id, "Client initiated close");
                    break;
                }
                Ok(Message::Binary(_)) => {
                    warn!(connection_id = %connection_id, "Received binary message, ignoring");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                Err(e) => {
                    debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                    break;
                }
            }
        }
    };

    tokio::select! {
        _ = reader => {},
        _ = &mut writer => {
            debug!(connection_id = %connection_id, "Writer finished before reader");
        },
    }

    state.relay.on_disconnect(&connection_id).await;
    writer.abort();

    let duration = start_time.elapsed();
    info!(connection_id = %connection_id, ?duration, "WebSocket connection closed");
}

/// Handle one inbound text frame
async fn handle_client_message(
    state: &WebSocketState,
    connection_id: &ConnectionId,
    outbound: &Outbound,
    text: &str,
) -> Result<(), WsHandlerError> {
    let command: ClientCommand =
        serde_json::from_str(text).map_err(|e| WsHandlerError::InvalidCommand(e.to_string()))?;

    match command {
        ClientCommand::Identify { name } => {
            state.relay.on_identity_announced(connection_id, name).await?;
        }
        ClientCommand::Message { text } => {
            state.relay.on_message(connection_id, &text).await;
        }
        ClientCommand::Ping => {
            send_direct(
                outbound,
                &ServerMessage::Ack {
                    id: connection_id.to_string(),
                    status: "pong".to_string(),
                },
            );
        }
    }

    Ok(())
}

/// Queue a reply for this connection only
fn send_direct(outbound: &Outbound, message: &ServerMessage) {
    match serde_json::to_string(message) {
        Ok(frame) => {
            if let Err(e) = outbound.try_send(frame) {
                debug!(error = %e, "Direct reply dropped");
            }
        }
        Err(e) => warn!(error = %e, "Failed to serialize direct reply"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_server_infrastructure::RealtimeMetrics;

    fn test_state() -> WebSocketState {
        let relay = Arc::new(PresenceRelay::new(None, RealtimeMetrics::new().unwrap()));
        WebSocketState::new(relay, 16)
    }

    #[tokio::test]
    async fn test_identify_then_message() {
        let state = test_state();
        let (tx, mut rx) = mpsc::channel(16);
        let id = state.relay().on_connect(tx.clone()).await;

        handle_client_message(&state, &id, &tx, r#"{"cmd":"username","name":"Alice"}"#)
            .await
            .unwrap();
        handle_client_message(&state, &id, &tx, r#"{"cmd":"message","text":"hi"}"#)
            .await
            .unwrap();

        let frames: Vec<ServerMessage> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|f| serde_json::from_str(&f).unwrap())
            .collect();
        assert!(matches!(frames[0], ServerMessage::History { .. }));
        assert!(matches!(&frames[2], ServerMessage::Entry(e) if e.text == "Alice: hi"));
    }

    #[tokio::test]
    async fn test_ping_is_acknowledged() {
        let state = test_state();
        let (tx, mut rx) = mpsc::channel(16);
        let id = state.relay().on_connect(tx.clone()).await;

        handle_client_message(&state, &id, &tx, r#"{"cmd":"ping"}"#)
            .await
            .unwrap();

        let reply: ServerMessage = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(
            reply,
            ServerMessage::Ack {
                id: id.to_string(),
                status: "pong".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_frame_is_invalid_command() {
        let state = test_state();
        let (tx, _rx) = mpsc::channel(16);
        let id = state.relay().on_connect(tx.clone()).await;

        let err = handle_client_message(&state, &id, &tx, "not json")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_command");
    }

    #[tokio::test]
    async fn test_second_identity_surfaces_relay_error() {
        let state = test_state();
        let (tx, _rx) = mpsc::channel(16);
        let id = state.relay().on_connect(tx.clone()).await;
        let frame = r#"{"cmd":"username","name":"Alice"}"#;

        handle_client_message(&state, &id, &tx, frame).await.unwrap();
        let err = handle_client_message(&state, &id, &tx, frame)
            .await
            .unwrap_err();

        assert_eq!(err.code(), "duplicate_connection");
    }
}
