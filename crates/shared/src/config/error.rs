//! Relay configuration errors
//!
//! Every variant names the `PARLOR_*` key or file at fault so startup can
//! abort with a message the operator can act on.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// A capacity key that is set but not a number
    #[error("{key} must be a whole number, got {value:?}")]
    InvalidNumber { key: String, value: String },

    /// A listener key that does not parse as `host:port`
    #[error("{key} must be an IP:port listener address, got {value:?}")]
    InvalidBind { key: String, value: String },

    /// The file passed with `--env-file` could not be read
    #[error("Cannot read env file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenv::Error,
    },

    /// Values parsed but break a relay constraint
    #[error("Relay configuration rejected: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_capacity_names_key_and_value() {
        let err = ConfigError::InvalidNumber {
            key: "PARLOR_OUTBOUND_CAPACITY".to_string(),
            value: "lots".to_string(),
        };
        assert_eq!(
            err.to_string(),
            r#"PARLOR_OUTBOUND_CAPACITY must be a whole number, got "lots""#
        );
    }

    #[test]
    fn test_bad_bind_names_key() {
        let err = ConfigError::InvalidBind {
            key: "PARLOR_WS_BIND".to_string(),
            value: "localhost".to_string(),
        };
        assert!(err.to_string().starts_with("PARLOR_WS_BIND must be"));
    }

    #[test]
    fn test_missing_env_file_keeps_io_source() {
        let err = ConfigError::EnvFile {
            path: PathBuf::from("relay.env"),
            source: dotenv::Error::Io(std::io::Error::from(std::io::ErrorKind::NotFound)),
        };
        assert!(err.to_string().contains("relay.env"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
