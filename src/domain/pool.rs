//! On-chain pool stake totals.
//!
//! The program keeps one `pools` mapping entry per market. The node returns
//! it as a struct literal:
//!
//! ```text
//! {
//!   title: 123field,
//!   total_staked: 1500000u64,
//!   option_a_stakes: 1000000u64,
//!   option_b_stakes: 500000u64,
//!   ...
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Stake totals mirrored from the `pools` mapping, in microcredits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub total_staked: u64,
    pub option_a_stakes: u64,
    pub option_b_stakes: u64,
}

impl PoolStats {
    /// Extract the stake totals from a mapping value.
    ///
    /// Returns `None` unless all three members are present as `u64`
    /// literals.
    #[must_use]
    pub fn from_mapping_value(value: &str) -> Option<Self> {
        Some(Self {
            total_staked: member_u64(value, "total_staked")?,
            option_a_stakes: member_u64(value, "option_a_stakes")?,
            option_b_stakes: member_u64(value, "option_b_stakes")?,
        })
    }
}

/// Value of `name: <digits>u64` inside a struct literal.
fn member_u64(value: &str, name: &str) -> Option<u64> {
    value
        .split(|c: char| matches!(c, ',' | '{' | '}'))
        .find_map(|member| {
            let (key, literal) = member.split_once(':')?;
            if key.trim() != name {
                return None;
            }
            literal.trim().strip_suffix("u64")?.parse().ok()
        })
}
