//! Realtime WebSocket Protocol
//!
//! Types exchanged between the relay and chat clients over WebSocket.

pub mod commands;
pub mod messages;

pub use commands::ClientCommand;
pub use messages::{ServerMessage, TranscriptEntry};
