//! Outcome rule: observation versus threshold.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Winning side of a binary market, encoded as the on-chain option index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WinningOption {
    /// Option 1.
    Yes,
    /// Option 2.
    No,
}

impl WinningOption {
    /// On-chain option index (1 = YES, 2 = NO).
    #[must_use]
    pub const fn index(self) -> u64 {
        match self {
            Self::Yes => 1,
            Self::No => 2,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::No => "NO",
        }
    }
}

impl fmt::Display for WinningOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<u64> for WinningOption {
    type Error = DomainError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Yes),
            2 => Ok(Self::No),
            other => Err(DomainError::InvalidWinningOption(other)),
        }
    }
}

/// Map an observation and a threshold to the winning option.
///
/// YES when `value >= threshold`, NO otherwise. A tie resolves YES.
/// A NaN observation compares false and therefore resolves NO.
#[must_use]
pub fn winning_option(value: f64, threshold: f64) -> WinningOption {
    if value >= threshold {
        WinningOption::Yes
    } else {
        WinningOption::No
    }
}

/// A single metric reading, valid only for the poll cycle that fetched it.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Provider that produced the value.
    pub provider: String,
    /// Observed value.
    pub value: f64,
}

impl Observation {
    /// Outcome of this observation against a market threshold.
    #[must_use]
    pub fn outcome(&self, threshold: f64) -> WinningOption {
        winning_option(self.value, threshold)
    }
}
