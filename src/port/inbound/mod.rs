//! Operator-facing inbound ports consumed by CLI adapters.

pub mod operator;
