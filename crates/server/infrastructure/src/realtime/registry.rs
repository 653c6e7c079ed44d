//! Session Registry
//!
//! Maps each live connection to its joined [`Session`]. The registry is not
//! synchronized on its own; the relay owns it behind its single lock.

use crate::realtime::session::{Outbound, Session};
use parlor_shared::{Color, ConnectionId, RelayError};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<ConnectionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session with a color drawn from the palette.
    ///
    /// Display names are taken verbatim and may collide across sessions.
    pub fn register(
        &mut self,
        connection_id: ConnectionId,
        display_name: impl Into<String>,
        outbound: Outbound,
    ) -> Result<Session, RelayError> {
        if self.sessions.contains_key(&connection_id) {
            return Err(RelayError::DuplicateConnection { connection_id });
        }

        let session = Session::new(
            connection_id.clone(),
            display_name,
            Color::random(),
            outbound,
        );
        self.sessions.insert(connection_id.clone(), session.clone());
        debug!(connection_id = %connection_id, color = %session.color(), "Session registered");
        Ok(session)
    }

    pub fn lookup(&self, connection_id: &ConnectionId) -> Option<&Session> {
        self.sessions.get(connection_id)
    }

    /// Idempotent: removing an unknown id returns `None`.
    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<Session> {
        let removed = self.sessions.remove(connection_id);
        if removed.is_some() {
            debug!(connection_id = %connection_id, "Session unregistered");
        }
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
