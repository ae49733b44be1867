//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`metric`] - Fake [`MetricProvider`](crate::port::outbound::metric::MetricProvider)
//!   implementations: `FixedMetric`, `FailingMetric`, `ScriptedMetric`.
//! - [`ledger`] - `RecordingLedger` and `ScriptedBroadcaster` for the
//!   submission protocol, `ScriptedPools` for stake syncing.
//! - [`store`] - `MemoryStore`, an in-memory market store and journal.
//! - [`http`] - `CannedServer`, a scripted HTTP endpoint for adapter tests.
//! - [`config`] - Canonical test configurations.

pub mod config;
pub mod http;
pub mod ledger;
pub mod metric;
pub mod store;

use crate::domain::NewMarket;

/// Pending market registration for tests. Panics on invalid input.
pub fn market(id: &str, deadline: i64, threshold: f64, metric: &str) -> NewMarket {
    NewMarket::try_new(id, deadline, threshold, metric).expect("valid test market")
}
