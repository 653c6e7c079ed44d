//! Joined session with a non-blocking outbound queue

use parlor_shared::{ANONYMOUS_LABEL, Color, ConnectionId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::mpsc::{self, OwnedPermit};
use tracing::warn;

/// Sending half of a connection's outbound queue. Frames are serialized
/// `ServerMessage` JSON.
pub type Outbound = mpsc::Sender<String>;

/// Per-recipient delivery failure. Always recovered by the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Backpressure: channel full")]
    Backpressure,

    #[error("Session closed")]
    Closed,
}

/// Label and color a transcript entry is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub label: String,
    pub color: Color,
}

impl Identity {
    /// Fallback identity for connections without a registered session.
    pub fn anonymous() -> Self {
        Self {
            label: ANONYMOUS_LABEL.to_string(),
            color: Color::neutral(),
        }
    }
}

/// Frames handed to or dropped for one session over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub sent: u64,
    pub dropped: u64,
}

/// One joined client. Clones share the outbound queue and counters.
#[derive(Debug, Clone)]
pub struct Session {
    connection_id: ConnectionId,
    display_name: String,
    color: Color,
    tx: Outbound,
    messages_sent: Arc<AtomicU64>,
    messages_dropped: Arc<AtomicU64>,
    joined_at: Instant,
}

impl Session {
    pub fn new(
        connection_id: ConnectionId,
        display_name: impl Into<String>,
        color: Color,
        tx: Outbound,
    ) -> Self {
        Self {
            connection_id,
            display_name: display_name.into(),
            color,
            tx,
            messages_sent: Arc::new(AtomicU64::new(0)),
            messages_dropped: Arc::new(AtomicU64::new(0)),
            joined_at: Instant::now(),
        }
    }

    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn color(&self) -> &Color {
        &self.color
    }

    pub fn joined_at(&self) -> Instant {
        self.joined_at
    }

    pub fn identity(&self) -> Identity {
        Identity {
            label: self.display_name.clone(),
            color: self.color.clone(),
        }
    }

    /// Hands a frame to the outbound queue without waiting.
    pub fn send_message(&self, message: String) -> Result<(), SessionError> {
        match self.tx.try_send(message) {
            Ok(()) => {
                self.messages_sent.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.messages_dropped.fetch_add(1, Ordering::Relaxed);
                warn!(connection_id = %self.connection_id, "Backpressure detected on session");
                Err(SessionError::Backpressure)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.messages_dropped.fetch_add(1, Ordering::Relaxed);
                Err(SessionError::Closed)
            }
        }
    }

    /// Sends into a queue slot reserved earlier. Cannot hit backpressure.
    pub fn send_reserved(&self, slot: OwnedPermit<String>, message: String) {
        slot.send(message);
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivery_stats(&self) -> DeliveryStats {
        DeliveryStats {
            sent: self.messages_sent.load(Ordering::Relaxed),
            dropped: self.messages_dropped.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_creation() {
        let (tx, _rx) = mpsc::channel(8);
        let id = ConnectionId::new();
        let session = Session::new(id.clone(), "Alice", Color::new("#FF5733"), tx);

        assert_eq!(session.connection_id(), &id);
        assert_eq!(session.display_name(), "Alice");
        assert_eq!(session.identity().color, Color::new("#FF5733"));
    }

    #[tokio::test]
    async fn test_send_message_reaches_queue() {
        let (tx, mut rx) = mpsc::channel(8);
        let session = Session::new(ConnectionId::new(), "Alice", Color::neutral(), tx);

        session.send_message("hello".to_string()).unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
        assert_eq!(session.delivery_stats().sent, 1);
    }

    #[tokio::test]
    async fn test_full_queue_reports_backpressure() {
        let (tx, _rx) = mpsc::channel(1);
        let session = Session::new(ConnectionId::new(), "Alice", Color::neutral(), tx);

        session.send_message("first".to_string()).unwrap();
        let result = session.send_message("second".to_string());

        assert_eq!(result, Err(SessionError::Backpressure));
        assert_eq!(
            session.delivery_stats(),
            DeliveryStats {
                sent: 1,
                dropped: 1
            }
        );
    }

    #[tokio::test]
    async fn test_dropped_receiver_reports_closed() {
        let (tx, rx) = mpsc::channel(4);
        let session = Session::new(ConnectionId::new(), "Alice", Color::neutral(), tx);
        drop(rx);

        assert_eq!(
            session.send_message("lost".to_string()),
            Err(SessionError::Closed)
        );
        assert_eq!(session.delivery_stats().dropped, 1);
    }

    #[tokio::test]
    async fn test_reserved_slot_is_counted_as_sent() {
        let (tx, mut rx) = mpsc::channel(1);
        let slot = tx.clone().try_reserve_owned().unwrap();
        let session = Session::new(ConnectionId::new(), "Alice", Color::neutral(), tx);

        assert_eq!(
            session.send_message("crowded".to_string()),
            Err(SessionError::Backpressure)
        );
        session.send_reserved(slot, "history".to_string());

        assert_eq!(rx.recv().await.as_deref(), Some("history"));
        assert_eq!(session.delivery_stats(), DeliveryStats { sent: 1, dropped: 1 });
    }

    #[test]
    fn test_anonymous_identity() {
        let identity = Identity::anonymous();
        assert_eq!(identity.label, "Anonymous");
        assert_eq!(identity.color, Color::neutral());
    }
}
