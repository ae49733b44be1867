//! Metric source endpoints.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Base URLs and timeout for the metric providers.
///
/// `ETHERSCAN_API_KEY` is loaded from the environment at runtime.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub etherscan_url: String,
    pub beaconchain_url: String,
    pub coingecko_url: String,
    pub fear_greed_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    #[serde(skip)]
    pub etherscan_api_key: Option<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            etherscan_url: "https://api.etherscan.io/api".into(),
            beaconchain_url: "https://beaconcha.in/api/v1".into(),
            coingecko_url: "https://api.coingecko.com/api/v3".into(),
            fear_greed_url: "https://api.alternative.me/fng/".into(),
            timeout_ms: 10_000,
            etherscan_api_key: None,
        }
    }
}

impl MetricsConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
