//! Configuration Data Transfer Objects (DTOs)

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

pub const DEFAULT_WS_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_HTTP_BIND: &str = "0.0.0.0:5001";
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 1000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration DTO for the relay server
///
/// Single source of truth for server configuration, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayConfigDto {
    /// Listener addresses
    pub server: ServerBindConfig,

    /// Relay core tuning
    pub relay: RelayTuningConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Listener addresses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerBindConfig {
    /// WebSocket listener for chat clients
    pub ws_bind: SocketAddr,

    /// HTTP listener serving `/health` and `/metrics`
    pub http_bind: SocketAddr,
}

/// Relay core tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayTuningConfig {
    /// Frames buffered per connection before deliveries to it are dropped
    pub outbound_capacity: usize,

    /// Maximum retained transcript entries. `None` keeps everything.
    pub transcript_capacity: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for RelayTuningConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            transcript_capacity: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}
