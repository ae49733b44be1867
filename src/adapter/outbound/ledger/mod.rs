//! Ledger adapters: proving sidecar client and node broadcaster.

pub mod broadcaster;
pub mod sidecar;

pub use broadcaster::HttpBroadcaster;
pub use sidecar::SidecarLedgerClient;
