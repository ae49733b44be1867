//! Market lifecycle types.
//!
//! A market moves `Pending -> Resolved` exactly once. There is no failed
//! state: a market whose resolution attempt fails stays pending and is
//! retried on the next poll.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::MarketId;
use super::pool::PoolStats;

/// Label of option 1 when none is given.
pub const DEFAULT_OPTION_A: &str = "YES";

/// Label of option 2 when none is given.
pub const DEFAULT_OPTION_B: &str = "NO";

/// Lifecycle state of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketStatus {
    /// Awaiting resolution.
    Pending,
    /// Outcome submitted and accepted by the network. Terminal.
    Resolved,
}

impl MarketStatus {
    /// Storage representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "resolved" => Ok(Self::Resolved),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// A binary-outcome market tracked by the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    /// On-chain pool identifier.
    pub id: MarketId,
    /// Unix seconds at which the market becomes eligible for resolution.
    pub deadline: i64,
    /// Observation value at or above which YES wins.
    pub threshold: f64,
    /// Name of the metric provider that observes this market.
    pub metric_type: String,
    /// Lifecycle state.
    pub status: MarketStatus,
    /// Free-form description shown next to the pool. Off-chain only.
    pub description: String,
    pub option_a_label: String,
    pub option_b_label: String,
    /// Stake totals as of the last sync.
    pub stats: PoolStats,
}

impl Market {
    /// A market is due once its deadline has passed and it is still pending.
    ///
    /// Eligibility is monotone: a due market stays due on every later poll
    /// until it is resolved.
    #[must_use]
    pub fn is_due(&self, now: i64) -> bool {
        self.status == MarketStatus::Pending && now >= self.deadline
    }

    /// True once the market has reached its terminal state.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status == MarketStatus::Resolved
    }
}

/// Registration input for a market: everything except the status and
/// the synced stake totals.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMarket {
    pub id: MarketId,
    pub deadline: i64,
    pub threshold: f64,
    pub metric_type: String,
    pub description: String,
    pub option_a_label: String,
    pub option_b_label: String,
}

impl NewMarket {
    /// Validate and build a registration.
    ///
    /// # Errors
    ///
    /// Returns an error for a negative deadline or a non-finite threshold.
    pub fn try_new(
        id: impl Into<MarketId>,
        deadline: i64,
        threshold: f64,
        metric_type: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if deadline < 0 {
            return Err(DomainError::NegativeDeadline(deadline));
        }
        if !threshold.is_finite() {
            return Err(DomainError::NonFiniteThreshold(threshold));
        }
        Ok(Self {
            id: id.into(),
            deadline,
            threshold,
            metric_type: metric_type.into(),
            description: String::new(),
            option_a_label: DEFAULT_OPTION_A.to_string(),
            option_b_label: DEFAULT_OPTION_B.to_string(),
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Replace the option labels.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::EmptyLabel`] when either label is blank.
    pub fn with_labels(
        mut self,
        option_a: impl Into<String>,
        option_b: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let (option_a, option_b) = (option_a.into(), option_b.into());
        if option_a.trim().is_empty() || option_b.trim().is_empty() {
            return Err(DomainError::EmptyLabel);
        }
        self.option_a_label = option_a;
        self.option_b_label = option_b;
        Ok(self)
    }

    /// The pending market this registration creates.
    #[must_use]
    pub fn into_market(self) -> Market {
        Market {
            id: self.id,
            deadline: self.deadline,
            threshold: self.threshold,
            metric_type: self.metric_type,
            status: MarketStatus::Pending,
            description: self.description,
            option_a_label: self.option_a_label,
            option_b_label: self.option_b_label,
            stats: PoolStats::default(),
        }
    }
}
