//! # Station Configuration
//!
//! Where the gateway lives, how patient requests are, and who is scanning.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command-line flags (highest priority, applied by the station)      │
//! │     --gateway http://10.0.0.5:8888  --user alice                        │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     SCANSTOCK_GATEWAY_URL=http://10.0.0.5:8888                         │
//! │     SCANSTOCK_USER=alice                                               │
//! │     SCANSTOCK_TIMEOUT_MS / SCANSTOCK_MAX_RETRIES /                     │
//! │     SCANSTOCK_RETRY_DELAY_MS / SCANSTOCK_CONNECT_TIMEOUT_MS            │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     ~/.config/scanstock-station/station.toml (Linux)                   │
//! │     ~/Library/Application Support/com.scanstock.station/station.toml   │
//! │                                                                         │
//! │  4. Default Values (lowest priority)                                   │
//! │     http://localhost:8888, 10 s timeout, 3 retries, 1 s delay,         │
//! │     5 s connect timeout                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # station.toml
//! [gateway]
//! url = "http://localhost:8888"
//!
//! [request]
//! timeout_ms = 10000
//! max_retries = 3
//! retry_delay_ms = 1000
//! connect_timeout_ms = 5000
//!
//! [operator]
//! user = "WebUser"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::requester::RetryPolicy;

// =============================================================================
// Gateway Settings
// =============================================================================

/// Where requests are sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Base URL of the gateway. The backend URL itself is never configured here.
    #[serde(default = "default_gateway_url")]
    pub url: String,
}

fn default_gateway_url() -> String {
    "http://localhost:8888".to_string()
}

impl Default for GatewaySettings {
    fn default() -> Self {
        GatewaySettings {
            url: default_gateway_url(),
        }
    }
}

// =============================================================================
// Request Settings
// =============================================================================

/// Deadline and retry settings applied to every backend call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestSettings {
    /// Per-attempt deadline (milliseconds).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retries after the first attempt. 3 means at most 4 attempts.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts (milliseconds).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// TCP connect deadline of the HTTP client (milliseconds).
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    10_000
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    1_000
}
fn default_connect_timeout_ms() -> u64 {
    5_000
}

impl Default for RequestSettings {
    fn default() -> Self {
        RequestSettings {
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

// =============================================================================
// Operator Settings
// =============================================================================

/// Who is recorded on transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorSettings {
    #[serde(default = "default_user")]
    pub user: String,
}

fn default_user() -> String {
    scanstock_core::DEFAULT_USER.to_string()
}

impl Default for OperatorSettings {
    fn default() -> Self {
        OperatorSettings {
            user: default_user(),
        }
    }
}

// =============================================================================
// Main Station Configuration
// =============================================================================

/// Complete station configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StationConfig {
    #[serde(default)]
    pub gateway: GatewaySettings,

    #[serde(default)]
    pub request: RequestSettings,

    #[serde(default)]
    pub operator: OperatorSettings,
}

impl StationConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (station.toml)
    /// 3. Environment variables
    ///
    /// Command-line flags are layered on top by the caller, which then
    /// calls [`StationConfig::validate`] again.
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading station config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load station config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Station config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = Url::parse(&self.gateway.url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::InvalidUrl(format!(
                "Gateway URL must start with http:// or https://, got: {}",
                self.gateway.url
            )));
        }

        if self.request.timeout_ms == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout_ms must be greater than 0".into(),
            ));
        }

        if self.request.connect_timeout_ms == 0 {
            return Err(ClientError::InvalidConfig(
                "connect_timeout_ms must be greater than 0".into(),
            ));
        }

        scanstock_core::validation::validate_user(&self.operator.user)?;

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable numbers are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SCANSTOCK_GATEWAY_URL") {
            debug!(url = %url, "Overriding gateway URL from environment");
            self.gateway.url = url;
        }

        if let Some(user) = lookup("SCANSTOCK_USER") {
            self.operator.user = user;
        }

        if let Some(timeout) = lookup("SCANSTOCK_TIMEOUT_MS") {
            match timeout.parse::<u64>() {
                Ok(ms) => self.request.timeout_ms = ms,
                Err(_) => warn!(value = %timeout, "Ignoring invalid SCANSTOCK_TIMEOUT_MS"),
            }
        }

        if let Some(retries) = lookup("SCANSTOCK_MAX_RETRIES") {
            match retries.parse::<u32>() {
                Ok(n) => self.request.max_retries = n,
                Err(_) => warn!(value = %retries, "Ignoring invalid SCANSTOCK_MAX_RETRIES"),
            }
        }

        if let Some(delay) = lookup("SCANSTOCK_RETRY_DELAY_MS") {
            match delay.parse::<u64>() {
                Ok(ms) => self.request.retry_delay_ms = ms,
                Err(_) => warn!(value = %delay, "Ignoring invalid SCANSTOCK_RETRY_DELAY_MS"),
            }
        }

        if let Some(timeout) = lookup("SCANSTOCK_CONNECT_TIMEOUT_MS") {
            match timeout.parse::<u64>() {
                Ok(ms) => self.request.connect_timeout_ms = ms,
                Err(_) => warn!(value = %timeout, "Ignoring invalid SCANSTOCK_CONNECT_TIMEOUT_MS"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "scanstock", "station")
            .map(|dirs| dirs.config_dir().join("station.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Parsed gateway URL.
    pub fn gateway_url(&self) -> ClientResult<Url> {
        Ok(Url::parse(&self.gateway.url)?)
    }

    /// Operator name stamped on transactions.
    pub fn user(&self) -> &str {
        &self.operator.user
    }

    /// Connect deadline for the HTTP client.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.request.connect_timeout_ms)
    }

    /// Retry policy for the resilient requester.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(self.request.timeout_ms),
            max_retries: self.request.max_retries,
            retry_delay: Duration::from_millis(self.request.retry_delay_ms),
        }
    }
}
