//! Manual operations on the oracle.

use async_trait::async_trait;

use crate::domain::{
    Market, MarketId, Observation, TransactionId, WinningOption, DEFAULT_OPTION_A,
    DEFAULT_OPTION_B,
};
use crate::error::Result;

/// Input for `create-market`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateMarketRequest {
    /// A `<digits>field` literal or short text to encode.
    pub title: String,
    pub threshold: f64,
    /// Unix seconds at which the market becomes due.
    pub snapshot_time: u64,
    pub metric: String,
    pub description: String,
    pub option_a: String,
    pub option_b: String,
}

impl CreateMarketRequest {
    /// Request with no description and the default YES/NO labels.
    pub fn new(
        title: impl Into<String>,
        threshold: f64,
        snapshot_time: u64,
        metric: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            threshold,
            snapshot_time,
            metric: metric.into(),
            description: String::new(),
            option_a: DEFAULT_OPTION_A.to_string(),
            option_b: DEFAULT_OPTION_B.to_string(),
        }
    }
}

/// Outcome of a successful `create-market`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedMarket {
    pub market: Market,
    pub transaction_id: TransactionId,
}

/// Capability surface the CLI drives.
#[async_trait]
pub trait OracleOperator: Send + Sync {
    /// Resolve a market by hand. Marks it resolved once accepted.
    ///
    /// An earlier attempt that already reached the network is reused
    /// instead of submitting again.
    async fn resolve_market(&self, id: &MarketId, option: WinningOption)
        -> Result<TransactionId>;

    /// Open a pool on-chain and register it for automatic resolution.
    async fn create_market(&self, request: &CreateMarketRequest) -> Result<CreatedMarket>;

    /// Pending markets, or every market when `include_resolved`.
    async fn list_markets(&self, include_resolved: bool) -> Result<Vec<Market>>;

    /// Registered metric types.
    fn metric_names(&self) -> Vec<String>;

    /// Fetch one observation from a registered provider.
    async fn sample_metric(&self, name: &str) -> Result<Observation>;
}
