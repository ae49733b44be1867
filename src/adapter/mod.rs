//! Implementations of ports (hexagonal adapters).
//!
//! - [`inbound`] - CLI driving the operator port
//! - [`outbound`] - SQLite, HTTP metric sources and the ledger

pub mod inbound;
pub mod outbound;
