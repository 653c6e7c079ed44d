//! Configuration loader
//!
//! Loads configuration from an optional .env file and the process
//! environment.

use std::path::{Path, PathBuf};

use super::dto::{
    DEFAULT_HTTP_BIND, DEFAULT_LOG_LEVEL, DEFAULT_OUTBOUND_CAPACITY, DEFAULT_WS_BIND,
    LoggingConfig, RelayConfigDto, RelayTuningConfig, ServerBindConfig,
};
use super::error::{ConfigError, Result};
use super::validator::validate_relay_config;

/// Configuration loader
///
/// Variables already present in the process environment win over the .env
/// file, which only fills in what is missing.
///
/// # Example
///
/// ```ignore
/// use parlor_shared::config::ConfigLoader;
///
/// let loader = ConfigLoader::new(Some(".env".into()));
/// let config = loader.load_relay_config()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Optional path to .env file
    env_file_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(env_file_path: Option<PathBuf>) -> Self {
        Self { env_file_path }
    }

    /// Load and validate the relay configuration
    pub fn load_relay_config(&self) -> Result<RelayConfigDto> {
        if let Some(path) = &self.env_file_path {
            self.load_env_file(path)?;
        }

        let config = RelayConfigDto::from_env()?;
        validate_relay_config(&config)?;

        Ok(config)
    }

    fn load_env_file(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(ConfigError::EnvFile {
                path: path.to_path_buf(),
                source: dotenv::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path.display()),
                )),
            });
        }

        dotenv::from_path(path).map_err(|e| ConfigError::EnvFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }
}

// ============================================================================
// Implementation: RelayConfigDto::from_env
// ============================================================================

impl RelayConfigDto {
    /// Build configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// `from_env` is this with `std::env::var` as the lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            server: ServerBindConfig::from_lookup(&lookup)?,
            relay: RelayTuningConfig::from_lookup(&lookup)?,
            logging: LoggingConfig::from_lookup(&lookup),
        })
    }
}

impl ServerBindConfig {
    /// # Optional Variables
    ///
    /// - `PARLOR_WS_BIND`: Default "0.0.0.0:5000"
    /// - `PARLOR_HTTP_BIND`: Default "0.0.0.0:5001"
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            ws_bind: parse_socket_addr(lookup, "PARLOR_WS_BIND", DEFAULT_WS_BIND)?,
            http_bind: parse_socket_addr(lookup, "PARLOR_HTTP_BIND", DEFAULT_HTTP_BIND)?,
        })
    }
}

impl RelayTuningConfig {
    /// # Optional Variables
    ///
    /// - `PARLOR_OUTBOUND_CAPACITY`: Default 1000
    /// - `PARLOR_TRANSCRIPT_CAPACITY`: Default unbounded
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let outbound_capacity =
            parse_optional_var(lookup, "PARLOR_OUTBOUND_CAPACITY", DEFAULT_OUTBOUND_CAPACITY)?;

        let transcript_capacity = match lookup("PARLOR_TRANSCRIPT_CAPACITY") {
            Some(raw) if !raw.trim().is_empty() => {
                Some(parse_value("PARLOR_TRANSCRIPT_CAPACITY", &raw)?)
            }
            _ => None,
        };

        Ok(Self {
            outbound_capacity,
            transcript_capacity,
        })
    }
}

impl LoggingConfig {
    /// # Optional Variables
    ///
    /// - `PARLOR_LOG_LEVEL`: Default "info"
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let level = lookup("PARLOR_LOG_LEVEL")
            .map(|level| level.trim().to_lowercase())
            .filter(|level| !level.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Self { level }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse optional variable with default value. A present but malformed
/// value is an error.
fn parse_optional_var<F, T>(lookup: &F, var: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        Some(raw) => parse_value(var, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(var: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
{
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        key: var.to_string(),
        value: raw.to_string(),
    })
}

fn parse_socket_addr<F>(lookup: &F, var: &str, default: &str) -> Result<std::net::SocketAddr>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(var).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidBind {
            key: var.to_string(),
            value: raw.to_string(),
        })
}

// ============================================================================
// Tests
// ============================================================================
