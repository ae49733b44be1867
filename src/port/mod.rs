//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports are the seams between the resolution logic and the outside world.
//! Adapters implement them; tests substitute fakes from `testkit`.
//!
//! ```text
//!                  ┌─────────────────────────┐
//!                  │       Application       │
//!                  │  scheduler · submitter  │
//!                  └────────────┬────────────┘
//!        ┌──────────────┬───────┴──────┬──────────────┐
//!        ▼              ▼              ▼              ▼
//!   ┌─────────┐   ┌──────────┐   ┌──────────┐   ┌───────────┐
//!   │  Store  │   │  Metric  │   │  Ledger  │   │ Broadcast │
//!   │ Adapter │   │ Adapters │   │ Adapter  │   │  Adapter  │
//!   └─────────┘   └──────────┘   └──────────┘   └───────────┘
//! ```

pub mod inbound;
pub mod outbound;
