//! Watchdog Configuration
//!
//! Reads the relay deployment's key-value env file once at startup.
//! Unrecognized keys are ignored so the file can be shared with the relay
//! itself; a missing file falls back to built-in defaults.
//!
//! ## Loading Order
//!
//! 1. Explicit `--config` path from the CLI
//! 2. `MAVWD_CONFIG` environment variable
//! 3. `/opt/mavlink/config.env`
//! 4. Built-in defaults

pub mod defaults;

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Configuration failures that abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value `{value}` for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("probe port must be non-zero")]
    InvalidPort,

    #[error("silence threshold must be greater than zero")]
    InvalidThreshold,
}

/// Immutable watchdog configuration, resolved once at process start.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// UDP control port of the monitored relay on loopback.
    pub probe_port: u16,
    /// How long the link may stay silent before a restart is triggered.
    pub silence_threshold: Duration,
    /// systemd unit name of the monitored relay.
    pub service_name: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            probe_port: defaults::PROBE_PORT,
            silence_threshold: Duration::from_secs(defaults::SILENCE_THRESHOLD_SECS),
            service_name: defaults::SERVICE_NAME.to_string(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration using the standard search order.
    ///
    /// An explicit `--config` path must be readable; the env-var and
    /// default locations fall back to built-in defaults when absent.
    /// Malformed values in any located file are fatal.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit_path {
            let contents =
                std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                })?;
            let config = Self::from_env_file(&contents)?;
            info!(path = %path.display(), "Loaded watchdog config");
            return Ok(config);
        }

        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                let contents =
                    std::fs::read_to_string(&p).map_err(|source| ConfigError::Unreadable {
                        path: p.clone(),
                        source,
                    })?;
                let config = Self::from_env_file(&contents)?;
                info!(path = %p.display(), "Loaded watchdog config from MAVWD_CONFIG");
                return Ok(config);
            }
            warn!(path = %path, "MAVWD_CONFIG points to non-existent file, falling back");
        }

        let default_path = Path::new(defaults::CONFIG_PATH);
        if default_path.exists() {
            let contents =
                std::fs::read_to_string(default_path).map_err(|source| ConfigError::Unreadable {
                    path: default_path.to_path_buf(),
                    source,
                })?;
            let config = Self::from_env_file(&contents)?;
            info!(path = %default_path.display(), "Loaded watchdog config");
            return Ok(config);
        }

        info!("No config file found, using built-in defaults");
        Ok(Self::default())
    }

    /// Parse a key-value env file (`KEY=value` per line, `#` comments).
    ///
    /// Recognized keys: `INTERNAL_PORT`, `SERVICE_NAME`, `TIMEOUT_SECONDS`.
    /// Everything else is ignored.
    pub fn from_env_file(contents: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "INTERNAL_PORT" => {
                    config.probe_port =
                        value.parse().map_err(|_| ConfigError::InvalidValue {
                            key: "INTERNAL_PORT",
                            value: value.to_string(),
                        })?;
                }
                "SERVICE_NAME" => {
                    config.service_name = value.to_string();
                }
                "TIMEOUT_SECONDS" => {
                    let secs: u64 = value.parse().map_err(|_| ConfigError::InvalidValue {
                        key: "TIMEOUT_SECONDS",
                        value: value.to_string(),
                    })?;
                    config.silence_threshold = Duration::from_secs(secs);
                }
                other => {
                    debug!(key = other, "Ignoring unrecognized config key");
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Enforce startup invariants: non-zero port, positive threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe_port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.silence_threshold.is_zero() {
            return Err(ConfigError::InvalidThreshold);
        }
        Ok(())
    }
}
