//! Crypto Fear & Greed Index from alternative.me, 0 (fear) to 100 (greed).

use async_trait::async_trait;
use serde_json::Value;

use super::http::{endpoint, number, MetricHttp};
use crate::error::ProviderError;
use crate::port::outbound::metric::MetricProvider;

pub const NAME: &str = "fear_greed";

const PROVIDER: &str = "alternative.me";

pub struct FearGreedIndex {
    http: MetricHttp,
    base_url: String,
}

impl FearGreedIndex {
    #[must_use]
    pub fn new(http: MetricHttp, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl MetricProvider for FearGreedIndex {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch_value(&self) -> Result<f64, ProviderError> {
        let url = endpoint(PROVIDER, &self.base_url, "", &[])?;
        parse_index(&self.http.get_json(PROVIDER, &url).await?)
    }
}

pub(crate) fn parse_index(body: &Value) -> Result<f64, ProviderError> {
    match body.pointer("/metadata/error") {
        None | Some(Value::Null) => {}
        Some(Value::String(s)) if s.is_empty() => {}
        Some(error) => {
            return Err(ProviderError::Status {
                provider: PROVIDER,
                message: error.as_str().map_or_else(|| error.to_string(), str::to_string),
            })
        }
    }
    number(PROVIDER, body.pointer("/data/0/value"), "data[0].value")
}
