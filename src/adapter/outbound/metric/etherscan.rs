//! Ethereum gas price from the Etherscan gas oracle, in gwei.

use async_trait::async_trait;
use serde_json::Value;

use super::http::{endpoint, envelope_message, number, MetricHttp};
use crate::error::ProviderError;
use crate::port::outbound::metric::MetricProvider;

pub const NAME: &str = "eth_gas_price";

const PROVIDER: &str = "etherscan";

pub struct EthGasPrice {
    http: MetricHttp,
    base_url: String,
    api_key: Option<String>,
}

impl EthGasPrice {
    #[must_use]
    pub fn new(http: MetricHttp, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl MetricProvider for EthGasPrice {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch_value(&self) -> Result<f64, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey("ETHERSCAN_API_KEY"))?;
        let url = endpoint(
            PROVIDER,
            &self.base_url,
            "",
            &[("module", "gastracker"), ("action", "gasoracle"), ("apikey", api_key)],
        )?;
        parse_gas_oracle(&self.http.get_json(PROVIDER, &url).await?)
    }
}

/// `result.ProposeGasPrice`, the oracle's average recommendation.
pub(crate) fn parse_gas_oracle(body: &Value) -> Result<f64, ProviderError> {
    if body.get("status").and_then(Value::as_str) != Some("1") {
        return Err(ProviderError::Status {
            provider: PROVIDER,
            message: envelope_message(body),
        });
    }
    let result = body.get("result").unwrap_or(&Value::Null);
    number(PROVIDER, result.get("ProposeGasPrice"), "result.ProposeGasPrice")
}
