//! Client Commands sent to WebSocket Server

use serde::{Deserialize, Serialize};

/// Commands sent from client to server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd")]
pub enum ClientCommand {
    /// Announce the display name for this connection. Any string is accepted.
    #[serde(rename = "username")]
    Identify { name: String },

    /// Post a chat message to the room
    #[serde(rename = "message")]
    Message { text: String },

    /// Keepalive, answered with an ack
    #[serde(rename = "ping")]
    Ping,
}
