//! Market Oracle - automated resolution of binary prediction markets.
//!
//! A single worker polls a SQLite market table, fetches the metric each
//! due market names, compares it with the market's threshold and submits
//! the winning option on-chain through a ledger sidecar. Markets are marked
//! resolved only after the broadcast endpoint accepts the transaction.
//!
//! # Architecture
//!
//! - [`domain`] - Markets, outcomes and on-chain argument encoding (no I/O)
//! - [`port`] - Traits the application depends on
//! - [`application`] - Metric registry, resolution submitter, scheduler
//! - [`adapter`] - SQLite store, HTTP metric providers, ledger client, CLI
//! - [`infrastructure`] - Configuration and wiring
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use market_oracle::infrastructure::{bootstrap, config::Config};
//!
//! # async fn demo() -> market_oracle::error::Result<()> {
//! let config = Config::load("oracle.toml")?;
//! config.init_logging().ok();
//! let scheduler = bootstrap::build_scheduler(&config).await?;
//! scheduler.run().await
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
