//! Gateway configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. The backend URL has no default: a gateway without one has
//! nowhere to forward to.

use std::env;
use std::time::Duration;
use url::Url;

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Interface to listen on
    pub bind_addr: String,

    /// HTTP port
    pub port: u16,

    /// The single backend every request is forwarded to
    pub backend_url: Url,

    /// Deadline for one upstream exchange
    pub upstream_timeout: Duration,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend_url = lookup("BACKEND_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired("BACKEND_URL".to_string()))?;
        let backend_url = Url::parse(backend_url.trim())
            .map_err(|_| ConfigError::InvalidValue("BACKEND_URL".to_string()))?;
        if backend_url.scheme() != "http" && backend_url.scheme() != "https" {
            return Err(ConfigError::InvalidValue("BACKEND_URL".to_string()));
        }

        let config = GatewayConfig {
            bind_addr: lookup("GATEWAY_BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),

            port: lookup("GATEWAY_PORT")
                .unwrap_or_else(|| "8888".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("GATEWAY_PORT".to_string()))?,

            backend_url,

            upstream_timeout: lookup("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".to_string())
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| ConfigError::InvalidValue("UPSTREAM_TIMEOUT_SECS".to_string()))?,
        };

        Ok(config)
    }

    /// Returns the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to build upstream client: {0}")]
    Client(String),
}
