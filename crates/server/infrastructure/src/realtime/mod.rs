//! Realtime presence relay
//!
//! Session registry, transcript store, broadcast dispatch and the connection
//! lifecycle that ties them together.

pub mod dispatcher;
pub mod metrics;
pub mod registry;
pub mod relay;
pub mod session;
pub mod transcript;

// Re-exports
pub use dispatcher::{BroadcastDispatcher, BroadcastOutcome};
pub use metrics::{RealtimeMetrics, RealtimeMetricsSnapshot};
pub use registry::SessionRegistry;
pub use relay::{LifecycleState, PresenceRelay};
pub use session::{DeliveryStats, Identity, Outbound, Session, SessionError};
pub use transcript::TranscriptStore;
