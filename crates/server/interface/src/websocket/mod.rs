//! WebSocket Handler Module for the chat relay
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  TcpListener (PARLOR_WS_BIND)                │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ accept + handshake
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      WebSocket Handler                       │
//! │  1. on_connect: mint connection id, hand over outbound queue │
//! │  2. reader: parse ClientCommand frames, drive the relay      │
//! │  3. writer: drain outbound queue into the socket             │
//! │  4. on_disconnect when either side ends                      │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//!                                ▼
//!                         PresenceRelay
//! ```
//!
//! ## Protocol
//!
//! Client frames: `{"cmd":"username","name":"Alice"}`,
//! `{"cmd":"message","text":"hi"}`, `{"cmd":"ping"}`.
//!
//! Server frames: `history`, `msg`, `ack` and `err`, see
//! [`parlor_shared::realtime::ServerMessage`].

mod handler;
mod listener;

pub use handler::{WebSocketState, WsHandlerError, handle_websocket};
pub use listener::serve_websocket;

// Re-export types from shared crate
pub use parlor_shared::realtime::commands::ClientCommand;
pub use parlor_shared::realtime::messages::ServerMessage;
