//! CoinGecko-backed metrics.
//!
//! - `eth_price`: ETH spot price in USD.
//! - `stablecoin_peg`: USDT price in USD.
//! - `btc_dominance`: 1.0 while BTC is ranked first by market cap, else 0.0.

use async_trait::async_trait;
use serde_json::Value;

use super::http::{endpoint, number, MetricHttp};
use crate::error::ProviderError;
use crate::port::outbound::metric::MetricProvider;

pub const ETH_PRICE: &str = "eth_price";
pub const STABLECOIN_PEG: &str = "stablecoin_peg";
pub const BTC_DOMINANCE: &str = "btc_dominance";

const PROVIDER: &str = "coingecko";

/// USD spot price of one coin from `/simple/price`.
pub struct SpotPrice {
    name: &'static str,
    coin: &'static str,
    http: MetricHttp,
    base_url: String,
}

impl SpotPrice {
    #[must_use]
    pub fn eth_price(http: MetricHttp, base_url: impl Into<String>) -> Self {
        Self {
            name: ETH_PRICE,
            coin: "ethereum",
            http,
            base_url: base_url.into(),
        }
    }

    #[must_use]
    pub fn stablecoin_peg(http: MetricHttp, base_url: impl Into<String>) -> Self {
        Self {
            name: STABLECOIN_PEG,
            coin: "tether",
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl MetricProvider for SpotPrice {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch_value(&self) -> Result<f64, ProviderError> {
        let url = endpoint(
            PROVIDER,
            &self.base_url,
            "simple/price",
            &[("ids", self.coin), ("vs_currencies", "usd")],
        )?;
        parse_simple_price(&self.http.get_json(PROVIDER, &url).await?, self.coin)
    }
}

/// Whether BTC still leads by market cap.
pub struct BtcDominance {
    http: MetricHttp,
    base_url: String,
}

impl BtcDominance {
    #[must_use]
    pub fn new(http: MetricHttp, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl MetricProvider for BtcDominance {
    fn name(&self) -> &str {
        BTC_DOMINANCE
    }

    async fn fetch_value(&self) -> Result<f64, ProviderError> {
        let url = endpoint(
            PROVIDER,
            &self.base_url,
            "coins/markets",
            &[
                ("vs_currency", "usd"),
                ("ids", "bitcoin"),
                ("order", "market_cap_desc"),
            ],
        )?;
        parse_market_rank(&self.http.get_json(PROVIDER, &url).await?)
    }
}

/// `{coin: {usd: price}}`.
pub(crate) fn parse_simple_price(body: &Value, coin: &str) -> Result<f64, ProviderError> {
    let price = body.get(coin).and_then(|c| c.get("usd"));
    number(PROVIDER, price, &format!("{coin}.usd"))
}

/// `[{market_cap_rank: n, ..}]` mapped to 1.0 when n == 1.
pub(crate) fn parse_market_rank(body: &Value) -> Result<f64, ProviderError> {
    let first = body
        .as_array()
        .and_then(|markets| markets.first())
        .ok_or_else(|| ProviderError::Malformed {
            provider: PROVIDER,
            reason: "expected a non-empty market list".into(),
        })?;
    let rank = number(PROVIDER, first.get("market_cap_rank"), "market_cap_rank")?;
    Ok(if rank == 1.0 { 1.0 } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::http::CannedServer;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn simple_price_reads_coin_usd() {
        let body = json!({ "ethereum": { "usd": 3124.55 } });
        assert!((parse_simple_price(&body, "ethereum").unwrap() - 3124.55).abs() < 1e-9);
    }

    #[test]
    fn simple_price_missing_coin_is_malformed() {
        let body = json!({ "bitcoin": { "usd": 1.0 } });
        let err = parse_simple_price(&body, "tether").unwrap_err();
        assert_eq!(err.to_string(), "malformed coingecko payload: missing tether.usd");
    }

    #[test]
    fn btc_ranked_first_is_one() {
        let body = json!([{ "id": "bitcoin", "market_cap_rank": 1 }]);
        assert!((parse_market_rank(&body).unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn btc_overtaken_is_zero() {
        let body = json!([{ "id": "bitcoin", "market_cap_rank": 2 }]);
        assert!(parse_market_rank(&body).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn empty_market_list_is_malformed() {
        assert!(parse_market_rank(&json!([])).is_err());
        assert!(parse_market_rank(&json!({ "status": { "error_code": 429 } })).is_err());
    }

    #[tokio::test]
    async fn eth_price_queries_simple_price() {
        let server = CannedServer::start(vec![(200, r#"{"ethereum":{"usd":3124.55}}"#)]).await;
        let provider = SpotPrice::eth_price(MetricHttp::new(Duration::from_secs(5)), &server.base_url);

        assert!((provider.fetch_value().await.unwrap() - 3124.55).abs() < 1e-9);
        assert_eq!(
            server.requests()[0].line,
            "GET /simple/price?ids=ethereum&vs_currencies=usd"
        );
    }

    #[tokio::test]
    async fn rate_limited_response_is_http_error() {
        let server = CannedServer::start(vec![(429, r#"{"status":{"error_code":429}}"#)]).await;
        let provider = BtcDominance::new(MetricHttp::new(Duration::from_secs(5)), &server.base_url);

        let err = provider.fetch_value().await.unwrap_err();

        assert!(matches!(err, ProviderError::Http { provider: "coingecko", .. }));
        assert!(server.requests()[0].line.starts_with("GET /coins/markets?vs_currency=usd&ids=bitcoin"));
    }
}
