//! HTTP metric providers.
//!
//! Each provider reduces one or more upstream calls to a single `f64`.
//! Payload parsing lives in plain functions so it is testable without a
//! network.

pub mod coingecko;
pub mod etherscan;
pub mod fear_greed;
pub mod http;
pub mod staking;

pub use coingecko::{BtcDominance, SpotPrice};
pub use etherscan::EthGasPrice;
pub use fear_greed::FearGreedIndex;
pub use http::MetricHttp;
pub use staking::EthStakingRate;
