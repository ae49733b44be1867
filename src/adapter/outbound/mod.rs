//! Outbound adapters: persistence, metric sources and the ledger.

pub mod ledger;
pub mod metric;
pub mod sqlite;
