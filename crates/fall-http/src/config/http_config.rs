//! HTTP server configuration
//!
//! Read from the process environment, falling back to [`HttpDefaults`].

use super::defaults::HttpDefaults;
use fall_core::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

/// HTTP server specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Maximum request body size in bytes
    pub max_request_size: usize,
    /// Server shutdown timeout in seconds
    pub shutdown_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: HttpDefaults::HOST.to_string(),
            port: HttpDefaults::PORT,
            max_request_size: HttpDefaults::MAX_REQUEST_SIZE,
            shutdown_timeout_secs: HttpDefaults::SHUTDOWN_TIMEOUT_SECS,
        }
    }
}

impl HttpConfig {
    /// Load configuration from `HTTP_HOST`, `PORT`, `HTTP_MAX_REQUEST_SIZE`
    /// and `HTTP_SHUTDOWN_TIMEOUT`
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = HttpConfig {
            host: env::var("HTTP_HOST").unwrap_or_else(|_| HttpDefaults::HOST.to_string()),
            port: parse_env("PORT", HttpDefaults::PORT, "valid port number")?,
            max_request_size: parse_env(
                "HTTP_MAX_REQUEST_SIZE",
                HttpDefaults::MAX_REQUEST_SIZE,
                "valid number of bytes",
            )?,
            shutdown_timeout_secs: parse_env(
                "HTTP_SHUTDOWN_TIMEOUT",
                HttpDefaults::SHUTDOWN_TIMEOUT_SECS,
                "valid number of seconds",
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if IpAddr::from_str(&self.host).is_err() {
            return Err(ConfigError::invalid_value(
                "host",
                self.host.clone(),
                "IP address",
            ));
        }

        if self.max_request_size == 0 {
            return Err(ConfigError::validation_failed(
                "max_request_size",
                "Maximum request size must be greater than 0",
            ));
        }

        if self.shutdown_timeout_secs == 0 {
            return Err(ConfigError::validation_failed(
                "shutdown_timeout_secs",
                "Shutdown timeout must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Address the server binds to
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = IpAddr::from_str(&self.host)
            .map_err(|_| ConfigError::invalid_value("host", self.host.clone(), "IP address"))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn parse_env<T: FromStr>(key: &str, default: T, expected: &str) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::invalid_value(key, raw.clone(), expected)),
        Err(_) => Ok(default),
    }
}
