//! Configuration loading and per-section settings.

pub mod ledger;
pub mod logging;
pub mod metrics;
pub mod settings;
pub mod worker;

pub use settings::Config;
