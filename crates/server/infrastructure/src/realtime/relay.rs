//! Presence Relay
//!
//! Connection lifecycle state machine on top of the session registry,
//! transcript store and broadcast dispatcher:
//!
//! ```text
//! on_connect ──► Connecting ──identity──► Joined ──disconnect──► Disconnected
//!                    │                                               ▲
//!                    └────────────────disconnect─────────────────────┘
//! ```
//!
//! Registry, transcript and the connection table live behind one lock.
//! Every lifecycle event takes it exactly once, so transcript appends form a
//! total order and each recipient's queue receives entries in that order.
//! Deliveries inside the lock are `try_send` handoffs only.

use crate::realtime::dispatcher::{BroadcastDispatcher, BroadcastOutcome};
use crate::realtime::metrics::RealtimeMetrics;
use crate::realtime::registry::SessionRegistry;
use crate::realtime::session::{Identity, Outbound, Session};
use crate::realtime::transcript::TranscriptStore;
use parlor_shared::realtime::{ServerMessage, TranscriptEntry};
use parlor_shared::{Color, ConnectionId, RelayError};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tokio::sync::mpsc::OwnedPermit;
use tracing::{debug, info, warn};

/// Observable lifecycle state of a live connection.
///
/// `Disconnected` is terminal and never stored: the connection is forgotten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Connecting,
    Joined,
}

#[derive(Debug)]
enum ConnectionSlot {
    Connecting {
        outbound: Outbound,
        /// Queue slot held back for the history replay at join.
        history_slot: Option<OwnedPermit<String>>,
    },
    Joined,
}

impl ConnectionSlot {
    fn state(&self) -> LifecycleState {
        match self {
            ConnectionSlot::Connecting { .. } => LifecycleState::Connecting,
            ConnectionSlot::Joined => LifecycleState::Joined,
        }
    }
}

#[derive(Debug)]
struct RelayState {
    connections: HashMap<ConnectionId, ConnectionSlot>,
    registry: SessionRegistry,
    transcript: TranscriptStore,
}

#[derive(Debug)]
pub struct PresenceRelay {
    state: Mutex<RelayState>,
    dispatcher: BroadcastDispatcher,
    metrics: RealtimeMetrics,
}

impl PresenceRelay {
    /// `transcript_capacity` of `None` retains the whole history.
    pub fn new(transcript_capacity: Option<usize>, metrics: RealtimeMetrics) -> Self {
        Self {
            state: Mutex::new(RelayState {
                connections: HashMap::new(),
                registry: SessionRegistry::new(),
                transcript: TranscriptStore::new(transcript_capacity),
            }),
            dispatcher: BroadcastDispatcher::new(metrics.clone()),
            metrics,
        }
    }

    pub fn metrics(&self) -> &RealtimeMetrics {
        &self.metrics
    }

    /// Records a new physical connection and mints its identifier.
    ///
    /// One slot of `outbound` is reserved right away so the history replay
    /// at join cannot be crowded out by direct replies queued before it.
    pub async fn on_connect(&self, outbound: Outbound) -> ConnectionId {
        let connection_id = ConnectionId::new();
        let history_slot = outbound.clone().try_reserve_owned().ok();
        if history_slot.is_none() {
            warn!(connection_id = %connection_id, "No queue slot left for history replay");
        }

        let mut state = self.state.lock().await;
        state.connections.insert(
            connection_id.clone(),
            ConnectionSlot::Connecting {
                outbound,
                history_slot,
            },
        );
        debug!(connection_id = %connection_id, "Connection opened");
        connection_id
    }

    /// `Connecting -> Joined`.
    ///
    /// Registers the session, replays the transcript privately to the
    /// joiner, then appends and broadcasts the join notice to everyone,
    /// the joiner included.
    pub async fn on_identity_announced(
        &self,
        connection_id: &ConnectionId,
        display_name: impl Into<String>,
    ) -> Result<Session, RelayError> {
        let display_name = display_name.into();
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let (outbound, history_slot) = match state.connections.get_mut(connection_id) {
            Some(ConnectionSlot::Connecting {
                outbound,
                history_slot,
            }) => (outbound.clone(), history_slot.take()),
            Some(ConnectionSlot::Joined) => {
                warn!(connection_id = %connection_id, "Identity announced twice");
                return Err(RelayError::DuplicateConnection {
                    connection_id: connection_id.clone(),
                });
            }
            None => {
                warn!(connection_id = %connection_id, "Identity announced for unknown connection");
                return Err(RelayError::UnknownConnection {
                    connection_id: connection_id.clone(),
                });
            }
        };

        let session = state
            .registry
            .register(connection_id.clone(), display_name.as_str(), outbound)?;
        state
            .connections
            .insert(connection_id.clone(), ConnectionSlot::Joined);
        self.metrics.session_joined();

        let history = ServerMessage::History {
            entries: state.transcript.snapshot(),
        };
        let replayed = match history_slot {
            Some(slot) => self.dispatcher.deliver_reserved(&session, slot, &history),
            None => self.dispatcher.deliver(&session, &history),
        };
        if !replayed {
            warn!(connection_id = %connection_id, "History replay was not delivered");
        }

        let notice = self.append(
            &mut state.transcript,
            format!("{} joined the chat.", display_name),
            Color::neutral(),
        );
        self.dispatcher.broadcast(&state.registry, &notice, None);

        info!(
            connection_id = %connection_id,
            display_name = %display_name,
            color = %session.color(),
            sessions = state.registry.len(),
            "Session joined"
        );
        Ok(session)
    }

    /// `Joined -> Joined`.
    ///
    /// Senders without a session are attributed to the anonymous identity.
    pub async fn on_message(&self, connection_id: &ConnectionId, text: &str) -> TranscriptEntry {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let identity = state
            .registry
            .lookup(connection_id)
            .map(Session::identity)
            .unwrap_or_else(Identity::anonymous);

        let entry = self.append(
            &mut state.transcript,
            format!("{}: {}", identity.label, text),
            identity.color,
        );
        let outcome = self.dispatcher.broadcast(&state.registry, &entry, None);
        debug!(connection_id = %connection_id, seq = entry.seq, ?outcome, "Message relayed");
        entry
    }

    /// `Connecting | Joined -> Disconnected`.
    ///
    /// Returns the leave notice, or `None` when the connection was already
    /// gone, in which case nothing is broadcast.
    pub async fn on_disconnect(&self, connection_id: &ConnectionId) -> Option<TranscriptEntry> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if state.connections.remove(connection_id).is_none() {
            debug!(connection_id = %connection_id, "Disconnect for unknown connection ignored");
            return None;
        }

        let removed = state.registry.remove(connection_id);
        let identity = match &removed {
            Some(session) => {
                self.metrics
                    .session_left(session.joined_at().elapsed().as_secs_f64());
                session.identity()
            }
            None => Identity::anonymous(),
        };

        let notice = self.append(
            &mut state.transcript,
            format!("{} left the chat.", identity.label),
            Color::neutral(),
        );
        let outcome: BroadcastOutcome = self.dispatcher.broadcast(&state.registry, &notice, None);

        let stats = removed
            .as_ref()
            .map(Session::delivery_stats)
            .unwrap_or_default();
        info!(
            connection_id = %connection_id,
            display_name = %identity.label,
            notified = outcome.delivered,
            frames_sent = stats.sent,
            frames_dropped = stats.dropped,
            "Session left"
        );
        Some(notice)
    }

    pub async fn snapshot(&self) -> Vec<TranscriptEntry> {
        self.state.lock().await.transcript.snapshot()
    }

    pub async fn lookup(&self, connection_id: &ConnectionId) -> Option<Session> {
        self.state.lock().await.registry.lookup(connection_id).cloned()
    }

    pub async fn connection_state(&self, connection_id: &ConnectionId) -> Option<LifecycleState> {
        self.state
            .lock()
            .await
            .connections
            .get(connection_id)
            .map(ConnectionSlot::state)
    }

    pub async fn session_count(&self) -> usize {
        self.state.lock().await.registry.len()
    }

    pub async fn transcript_len(&self) -> usize {
        self.state.lock().await.transcript.len()
    }

    fn append(&self, transcript: &mut TranscriptStore, text: String, color: Color) -> TranscriptEntry {
        let evicted_before = transcript.evicted();
        let entry = transcript.append(text, color);

        let evicted = transcript.evicted() - evicted_before;
        if evicted > 0 {
            self.metrics.record_evicted(evicted);
        }
        self.metrics.set_transcript_len(transcript.len());
        entry
    }
}
