//! Server messages for the WebSocket protocol
//!
//! Every frame the relay pushes to a client is one [`ServerMessage`],
//! serialized once per broadcast and shared by all recipients.

use crate::palette::Color;
use serde::{Deserialize, Serialize};

/// Server message envelope sent to WebSocket clients
///
/// - Tag "t" (type) for quick message type identification
/// - Content "d" for message payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t", content = "d")]
pub enum ServerMessage {
    /// Private replay of the transcript, sent once when a client joins
    #[serde(rename = "history")]
    History { entries: Vec<TranscriptEntry> },

    /// One broadcast entry
    #[serde(rename = "msg")]
    Entry(TranscriptEntry),

    /// Response to a connection or keepalive
    #[serde(rename = "ack")]
    Ack { id: String, status: String },

    /// Error addressed to a single client
    #[serde(rename = "err")]
    Error { code: String, msg: String },
}

/// Immutable record of one broadcast event.
///
/// The text is fully rendered, sender label included. The entry holds the
/// sender's label and color by value, so it outlives the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Position in the transcript, starting at 1
    pub seq: u64,
    pub text: String,
    pub color: Color,
    /// Unix timestamp in milliseconds
    pub at: i64,
}

impl TranscriptEntry {
    pub fn new(seq: u64, text: impl Into<String>, color: Color) -> Self {
        Self {
            seq,
            text: text.into(),
            color,
            at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
