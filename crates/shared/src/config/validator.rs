//! Configuration validation

use super::dto::RelayConfigDto;
use super::error::{ConfigError, Result};
use std::net::SocketAddr;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a listener bind address
pub fn validate_bind_address(addr: &SocketAddr) -> Result<()> {
    if addr.port() == 0 {
        return Err(ConfigError::Rejected(
            "Bind address port cannot be 0".to_string(),
        ));
    }

    if addr.port() < 1024 {
        return Err(ConfigError::Rejected(format!(
            "Bind address port {} is in privileged range (1-1023). \
             Use a non-privileged port (1024-65535)",
            addr.port()
        )));
    }

    Ok(())
}

/// Validate a queue or buffer capacity
pub fn validate_capacity(name: &str, capacity: usize) -> Result<()> {
    if capacity == 0 {
        return Err(ConfigError::Rejected(format!(
            "{} must be greater than 0",
            name
        )));
    }

    Ok(())
}

/// Validate a log level name
pub fn validate_log_level(level: &str) -> Result<()> {
    if !LOG_LEVELS.contains(&level) {
        return Err(ConfigError::Rejected(format!(
            "Unknown log level '{}', expected one of {}",
            level,
            LOG_LEVELS.join(", ")
        )));
    }

    Ok(())
}

/// Validate the complete relay configuration
pub fn validate_relay_config(config: &RelayConfigDto) -> Result<()> {
    validate_bind_address(&config.server.ws_bind)?;
    validate_bind_address(&config.server.http_bind)?;

    if config.server.ws_bind == config.server.http_bind {
        return Err(ConfigError::Rejected(format!(
            "WebSocket and HTTP listeners cannot share {}",
            config.server.ws_bind
        )));
    }

    validate_capacity("PARLOR_OUTBOUND_CAPACITY", config.relay.outbound_capacity)?;
    if let Some(capacity) = config.relay.transcript_capacity {
        validate_capacity("PARLOR_TRANSCRIPT_CAPACITY", capacity)?;
    }

    validate_log_level(&config.logging.level)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::dto::{LoggingConfig, RelayTuningConfig, ServerBindConfig};

    fn valid_config() -> RelayConfigDto {
        RelayConfigDto {
            server: ServerBindConfig {
                ws_bind: "0.0.0.0:5000".parse().unwrap(),
                http_bind: "0.0.0.0:5001".parse().unwrap(),
            },
            relay: RelayTuningConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_relay_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_bind_address_port_zero() {
        let addr: SocketAddr = "0.0.0.0:0".parse().unwrap();
        assert!(validate_bind_address(&addr).is_err());
    }

    #[test]
    fn test_bind_address_privileged_port() {
        let addr: SocketAddr = "0.0.0.0:80".parse().unwrap();
        assert!(validate_bind_address(&addr).is_err());
    }

    #[test]
    fn test_listeners_must_differ() {
        let mut config = valid_config();
        config.server.http_bind = config.server.ws_bind;
        assert!(validate_relay_config(&config).is_err());
    }

    #[test]
    fn test_zero_capacities_rejected() {
        let mut config = valid_config();
        config.relay.outbound_capacity = 0;
        assert!(validate_relay_config(&config).is_err());

        let mut config = valid_config();
        config.relay.transcript_capacity = Some(0);
        assert!(validate_relay_config(&config).is_err());
    }

    #[test]
    fn test_log_level() {
        assert!(validate_log_level("debug").is_ok());
        assert!(validate_log_level("verbose").is_err());
    }
}
