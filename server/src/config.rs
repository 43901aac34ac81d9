//! Configuration management for the server.

use std::env;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// `development` or `production`
    pub app_env: String,
    /// Expose backend error text in 500 responses
    pub debug: bool,
    /// Start with the sample catalogue loaded
    pub seed_sample_data: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let app_env = lookup("APP_ENV").unwrap_or_else(|| "development".to_string());

        let debug = match lookup("APP_DEBUG") {
            Some(raw) => parse_bool("APP_DEBUG", &raw)?,
            None => app_env == "development",
        };

        let seed_sample_data = match lookup("SEED_SAMPLE_DATA") {
            Some(raw) => parse_bool("SEED_SAMPLE_DATA", &raw)?,
            None => true,
        };

        Ok(Self {
            host,
            port,
            app_env,
            debug,
            seed_sample_data,
        })
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidBool(var)),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("Invalid boolean value for {0}")]
    InvalidBool(&'static str),
}
