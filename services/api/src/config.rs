//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    /// Simulated round-trip of login and registration.
    pub auth_latency: Duration,
    /// Origin of the UI allowed by CORS.
    pub allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Storage Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "sqlite://medication_tracker.db?mode=rwc".to_string());
        if !database_url.starts_with("sqlite:") {
            return Err(ConfigError::InvalidValue(
                "DATABASE_URL".to_string(),
                format!("'{}' is not a sqlite URL", database_url),
            ));
        }

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Session Simulation ---
        let auth_latency = match lookup("AUTH_LATENCY_MS") {
            Some(raw) => raw.parse::<u64>().map(Duration::from_millis).map_err(|_| {
                ConfigError::InvalidValue(
                    "AUTH_LATENCY_MS".to_string(),
                    format!("'{}' is not a number of milliseconds", raw),
                )
            })?,
            None => medication_tracker_core::session::DEFAULT_AUTH_LATENCY,
        };

        let allowed_origin =
            lookup("ALLOWED_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            auth_latency,
            allowed_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:3000");
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.auth_latency, Duration::from_secs(1));
        assert!(config.database_url.starts_with("sqlite:"));
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            load(&[("AUTH_LATENCY_MS", "soon")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "AUTH_LATENCY_MS"
        ));
        assert!(matches!(
            load(&[("DATABASE_URL", "postgres://localhost/db")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "DATABASE_URL"
        ));
        assert!(load(&[("BIND_ADDRESS", "nowhere")]).is_err());
    }

    #[test]
    fn latency_is_read_in_milliseconds() {
        let config = load(&[("AUTH_LATENCY_MS", "250")]).unwrap();
        assert_eq!(config.auth_latency, Duration::from_millis(250));
    }
}
