//! ETH staking rate: share of total supply locked in validators, in percent.
//!
//! Supply comes from Etherscan in wei. The staked amount comes from
//! beaconcha.in's ETH.STORE snapshot (`total_balance`, gwei), falling back
//! to validator statistics (`active_validators_total × 32` ETH) when the
//! primary endpoint fails for any reason.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::http::{endpoint, envelope_message, number, MetricHttp};
use crate::error::ProviderError;
use crate::port::outbound::metric::MetricProvider;

pub const NAME: &str = "eth_staking_rate";

const ETHERSCAN: &str = "etherscan";
const BEACONCHAIN: &str = "beaconcha.in";

const WEI_PER_ETH: f64 = 1e18;
const GWEI_PER_ETH: f64 = 1e9;
const ETH_PER_VALIDATOR: f64 = 32.0;

pub struct EthStakingRate {
    http: MetricHttp,
    etherscan_url: String,
    beaconchain_url: String,
    api_key: Option<String>,
}

impl EthStakingRate {
    #[must_use]
    pub fn new(
        http: MetricHttp,
        etherscan_url: impl Into<String>,
        beaconchain_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            http,
            etherscan_url: etherscan_url.into(),
            beaconchain_url: beaconchain_url.into(),
            api_key,
        }
    }

    async fn total_supply(&self, api_key: &str) -> Result<f64, ProviderError> {
        let url = endpoint(
            ETHERSCAN,
            &self.etherscan_url,
            "",
            &[("module", "stats"), ("action", "ethsupply"), ("apikey", api_key)],
        )?;
        parse_supply(&self.http.get_json(ETHERSCAN, &url).await?)
    }

    async fn total_staked(&self) -> Result<f64, ProviderError> {
        let primary = endpoint(BEACONCHAIN, &self.beaconchain_url, "ethstore/latest", &[])?;
        let primary = match self.http.get_json(BEACONCHAIN, &primary).await {
            Ok(body) => parse_ethstore(&body),
            Err(e) => Err(e),
        };
        match primary {
            Ok(staked) => Ok(staked),
            Err(e) => {
                warn!(error = %e, "ETH.STORE snapshot unavailable, using validator statistics");
                let fallback =
                    endpoint(BEACONCHAIN, &self.beaconchain_url, "validator/statistics", &[])?;
                parse_validator_statistics(&self.http.get_json(BEACONCHAIN, &fallback).await?)
            }
        }
    }
}

#[async_trait]
impl MetricProvider for EthStakingRate {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch_value(&self) -> Result<f64, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey("ETHERSCAN_API_KEY"))?;

        let supply = self.total_supply(api_key).await?;
        let staked = self.total_staked().await?;
        let rate = staking_rate(staked, supply)?;
        debug!(supply_eth = supply, staked_eth = staked, rate, "Staking rate observed");
        Ok(rate)
    }
}

/// Etherscan `ethsupply` result in ETH.
pub(crate) fn parse_supply(body: &Value) -> Result<f64, ProviderError> {
    if body.get("status").and_then(Value::as_str) != Some("1") {
        return Err(ProviderError::Status {
            provider: ETHERSCAN,
            message: envelope_message(body),
        });
    }
    Ok(number(ETHERSCAN, body.get("result"), "result")? / WEI_PER_ETH)
}

fn beaconchain_data(body: &Value) -> Result<&Value, ProviderError> {
    if body.get("status").and_then(Value::as_str) != Some("OK") {
        return Err(ProviderError::Status {
            provider: BEACONCHAIN,
            message: envelope_message(body),
        });
    }
    body.get("data").ok_or_else(|| ProviderError::Malformed {
        provider: BEACONCHAIN,
        reason: "missing data".into(),
    })
}

/// ETH.STORE `total_balance` in ETH.
pub(crate) fn parse_ethstore(body: &Value) -> Result<f64, ProviderError> {
    let data = beaconchain_data(body)?;
    Ok(number(BEACONCHAIN, data.get("total_balance"), "data.total_balance")? / GWEI_PER_ETH)
}

/// Active validators times 32 ETH.
pub(crate) fn parse_validator_statistics(body: &Value) -> Result<f64, ProviderError> {
    let data = beaconchain_data(body)?;
    let latest = data.get(0).unwrap_or(data);
    let validators = number(
        BEACONCHAIN,
        latest.get("active_validators_total"),
        "data[0].active_validators_total",
    )?;
    Ok(validators * ETH_PER_VALIDATOR)
}

/// `staked / supply × 100`.
pub(crate) fn staking_rate(staked: f64, supply: f64) -> Result<f64, ProviderError> {
    if supply <= 0.0 {
        return Err(ProviderError::Malformed {
            provider: ETHERSCAN,
            reason: format!("non-positive supply {supply}"),
        });
    }
    Ok(staked / supply * 100.0)
}
