//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe infrastructure dependencies: market persistence,
//! external metric sources, and the ledger execution backend.

pub mod ledger;
pub mod metric;
pub mod store;
