//! Command-line interface definitions.
//!
//! Defines the CLI structure for the oracle using `clap`: manual resolution,
//! market creation, the poll loop and a few inspection commands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::paths;
use crate::adapter::outbound::metric::staking;
use crate::domain::{DEFAULT_OPTION_A, DEFAULT_OPTION_B};

/// Oracle worker for binary prediction markets
#[derive(Parser, Debug)]
#[command(name = "oracle")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a market by hand
    Resolve(ResolveArgs),

    /// Open a pool on-chain and register it for automatic resolution
    CreateMarket(CreateMarketArgs),

    /// Run the resolution worker until interrupted
    Run,

    /// List markets
    Markets(MarketsArgs),

    /// Inspect metric providers
    #[command(subcommand)]
    Metrics(MetricsCommand),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Arguments for `oracle resolve`.
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Market id as stored (normally a `<digits>field` literal)
    pub market_id: String,

    /// 1 for YES, 2 for NO
    pub winning_option: u64,
}

/// Arguments for `oracle create-market`.
#[derive(Parser, Debug)]
pub struct CreateMarketArgs {
    /// Pool title: a `<digits>field` literal or short text to encode
    pub title_field: String,

    /// Resolve YES when the observed value is at least this
    #[arg(allow_negative_numbers = true)]
    pub threshold: f64,

    /// Unix seconds at which the market becomes due
    pub snapshot_time: u64,

    /// Metric type that decides the outcome
    #[arg(short, long, default_value = staking::NAME)]
    pub metric: String,

    /// Description stored alongside the market
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Label for option 1
    #[arg(long, default_value = DEFAULT_OPTION_A)]
    pub option_a: String,

    /// Label for option 2
    #[arg(long, default_value = DEFAULT_OPTION_B)]
    pub option_b: String,
}

/// Arguments for `oracle markets`.
#[derive(Parser, Debug)]
pub struct MarketsArgs {
    /// Include resolved markets
    #[arg(long)]
    pub all: bool,
}

/// Subcommands for `oracle metrics`.
#[derive(Subcommand, Debug)]
pub enum MetricsCommand {
    /// List registered metric types.
    List,
    /// Take one observation from a provider.
    Fetch {
        /// Metric type name
        name: String,
    },
}

/// Subcommands for `oracle config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration with defaults applied.
    Show,
    /// Validate the configuration file for correctness.
    Validate,
}
