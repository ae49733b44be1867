//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file with environment variable overrides
//! for sensitive values like `ORACLE_PRIVATE_KEY`.
//!
//! # Example
//!
//! ```no_run
//! use market_oracle::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging().ok();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ledger::LedgerConfig;
use super::logging::{LoggingConfig, TryInitError};
use super::metrics::MetricsConfig;
use super::worker::WorkerConfig;
use crate::error::{ConfigError, Result};
use crate::port::outbound::ledger::Credential;

/// Environment variable holding the oracle's signing key.
pub const PRIVATE_KEY_ENV: &str = "ORACLE_PRIVATE_KEY";
/// Environment variable overriding `ledger.node_url`.
pub const NODE_URL_ENV: &str = "ALEO_NODE_URL";
/// Environment variable holding the Etherscan API key.
pub const ETHERSCAN_KEY_ENV: &str = "ETHERSCAN_API_KEY";

/// Main application configuration.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Path to SQLite database file.
    ///
    /// Defaults to "oracle.db" in the current directory.
    #[serde(default = "default_database_path")]
    pub database: String,

    /// Program, network, fees and proving sidecar.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Poll loop settings.
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Metric source endpoints.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_database_path() -> String {
    "oracle.db".to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Parse configuration from TOML content, reading secrets from the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        Self::parse_toml_with_env(content, |key| std::env::var(key).ok())
    }

    /// Parse configuration from TOML content with an explicit environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml_with_env(
        content: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        // Secrets never come from the config file.
        config.ledger.credential = non_empty(env(PRIVATE_KEY_ENV)).map(Credential::new);
        config.metrics.etherscan_api_key = non_empty(env(ETHERSCAN_KEY_ENV));
        if let Some(node_url) = non_empty(env(NODE_URL_ENV)) {
            config.ledger.node_url = Some(node_url);
        }

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Load from `path` if it exists, otherwise use defaults plus environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or is invalid.
    #[allow(clippy::result_large_err)]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Self::parse_toml("")
        }
    }

    /// Initialize tracing from the `[logging]` section.
    ///
    /// # Errors
    /// Fails when a subscriber is already installed.
    pub fn init_logging(&self) -> std::result::Result<(), TryInitError> {
        self.logging.init()
    }

    /// Validate configuration values.
    ///
    /// A missing credential or node URL is not an error here: each
    /// submission reports it, so the worker keeps running.
    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "database" }.into());
        }
        if self.ledger.program_id.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "ledger.program_id",
            }
            .into());
        }
        if self.ledger.network.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "ledger.network",
            }
            .into());
        }
        if self.ledger.resolve_fee == 0 {
            return Err(ConfigError::InvalidValue {
                field: "resolve_fee",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.ledger.create_fee == 0 {
            return Err(ConfigError::InvalidValue {
                field: "create_fee",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.ledger.execution_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "execution_timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.ledger.broadcast_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "broadcast_timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        for (field, url) in [
            ("prover_url", Some(self.ledger.prover_url.as_str())),
            ("node_url", self.ledger.node_url.as_deref()),
        ] {
            if let Some(url) = url {
                url::Url::parse(url).map_err(|e| ConfigError::InvalidValue {
                    field,
                    reason: e.to_string(),
                })?;
            }
        }
        if self.worker.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.worker.failure_alert_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "failure_alert_threshold",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.metrics.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
