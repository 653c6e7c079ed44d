// Parlor - Infrastructure Layer
// Relay core: registry, transcript store, broadcast dispatch, lifecycle

pub mod realtime;

// Re-exports
pub use realtime::{PresenceRelay, RealtimeMetrics};
