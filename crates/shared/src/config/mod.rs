//! Configuration module for the Parlor relay
//!
//! Configuration is loaded once at startup, validated, and passed to the
//! server components as an immutable DTO.
//!
//! # Usage
//!
//! ```ignore
//! use parlor_shared::config::ConfigLoader;
//! use std::path::PathBuf;
//!
//! let loader = ConfigLoader::new(Some(PathBuf::from(".env")));
//! let config = loader.load_relay_config()?;
//! println!("WebSocket listener: {}", config.server.ws_bind);
//! ```
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `PARLOR_WS_BIND`: WebSocket listener (default: "0.0.0.0:5000")
//! - `PARLOR_HTTP_BIND`: health and metrics listener (default: "0.0.0.0:5001")
//! - `PARLOR_OUTBOUND_CAPACITY`: per-connection outbound queue size (default: 1000)
//! - `PARLOR_TRANSCRIPT_CAPACITY`: entries kept in the transcript (default: unbounded)
//! - `PARLOR_LOG_LEVEL`: log level (default: "info"); `RUST_LOG` overrides it

pub mod dto;
pub mod error;
pub mod loader;
pub mod validator;

pub use dto::{LoggingConfig, RelayConfigDto, RelayTuningConfig, ServerBindConfig};
pub use error::{ConfigError, Result};
pub use loader::ConfigLoader;
pub use validator::{
    validate_bind_address, validate_capacity, validate_log_level, validate_relay_config,
};
