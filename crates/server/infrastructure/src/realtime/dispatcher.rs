//! Broadcast Dispatcher
//!
//! Fans one transcript entry out to every registered session. Each delivery
//! is a non-blocking handoff into the recipient's outbound queue, so a slow
//! client never holds up the others or the relay lock.

use crate::realtime::metrics::RealtimeMetrics;
use crate::realtime::registry::SessionRegistry;
use crate::realtime::session::{Session, SessionError};
use parlor_shared::ConnectionId;
use parlor_shared::realtime::{ServerMessage, TranscriptEntry};
use std::time::Instant;
use tokio::sync::mpsc::OwnedPermit;
use tracing::{debug, error, warn};

/// Per-broadcast delivery tally. Failures are informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct BroadcastDispatcher {
    metrics: RealtimeMetrics,
}

impl BroadcastDispatcher {
    pub fn new(metrics: RealtimeMetrics) -> Self {
        Self { metrics }
    }

    /// Delivers `entry` to every registered session except `exclude`.
    ///
    /// The frame is serialized once and shared by all recipients.
    pub fn broadcast(
        &self,
        registry: &SessionRegistry,
        entry: &TranscriptEntry,
        exclude: Option<&ConnectionId>,
    ) -> BroadcastOutcome {
        let start = Instant::now();
        let Some(frame) = encode(&ServerMessage::Entry(entry.clone())) else {
            return BroadcastOutcome::default();
        };

        let mut outcome = BroadcastOutcome::default();
        for session in registry.iter() {
            if exclude == Some(session.connection_id()) {
                continue;
            }
            if self.deliver_frame(session, frame.clone()) {
                outcome.delivered += 1;
            } else {
                outcome.failed += 1;
            }
        }

        self.metrics
            .record_broadcast(start.elapsed().as_secs_f64() * 1000.0);
        debug!(
            seq = entry.seq,
            delivered = outcome.delivered,
            failed = outcome.failed,
            "Broadcast dispatched"
        );
        outcome
    }

    /// Delivers a message to a single session.
    pub fn deliver(&self, session: &Session, message: &ServerMessage) -> bool {
        match encode(message) {
            Some(frame) => self.deliver_frame(session, frame),
            None => false,
        }
    }

    /// Delivers a message through a queue slot reserved for it.
    pub fn deliver_reserved(
        &self,
        session: &Session,
        slot: OwnedPermit<String>,
        message: &ServerMessage,
    ) -> bool {
        match encode(message) {
            Some(frame) => {
                session.send_reserved(slot, frame);
                self.metrics.record_delivered();
                true
            }
            None => false,
        }
    }

    fn deliver_frame(&self, session: &Session, frame: String) -> bool {
        match session.send_message(frame) {
            Ok(()) => {
                self.metrics.record_delivered();
                true
            }
            Err(SessionError::Backpressure) => {
                self.metrics.record_backpressure();
                self.metrics.record_delivery_failed();
                warn!(connection_id = %session.connection_id(), "Dropped frame for slow recipient");
                false
            }
            Err(SessionError::Closed) => {
                self.metrics.record_delivery_failed();
                debug!(connection_id = %session.connection_id(), "Recipient already closed");
                false
            }
        }
    }
}

fn encode(message: &ServerMessage) -> Option<String> {
    serde_json::to_string(message)
        .map_err(|e| error!(error = %e, "Failed to serialize server message"))
        .ok()
}
