use crate::ids::ConnectionId;

/// Errors raised by the relay core.
///
/// Both variants are fatal only to the identity announcement that caused
/// them; the connection itself stays open.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("Connection already joined: {connection_id}")]
    DuplicateConnection { connection_id: ConnectionId },

    #[error("Connection not found: {connection_id}")]
    UnknownConnection { connection_id: ConnectionId },
}

impl RelayError {
    /// Short machine-readable code sent to clients in `err` frames.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::DuplicateConnection { .. } => "duplicate_connection",
            RelayError::UnknownConnection { .. } => "unknown_connection",
        }
    }
}
