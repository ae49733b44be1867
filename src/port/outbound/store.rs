//! Persistence ports for markets and submission attempts.

use async_trait::async_trait;

use crate::domain::{Market, MarketId, NewMarket, PoolStats, SubmissionAttempt};
use crate::error::Result;

/// Durable market table. Sole source of truth for lifecycle state.
///
/// Storage failures propagate as [`crate::error::Error::Storage`] and must
/// not be swallowed by callers.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Ensure the backing schema exists. Safe to call on every start.
    async fn initialize(&self) -> Result<()>;

    /// Create a pending market or replace a pending market's deadline,
    /// threshold, metric, description and labels. Fails with
    /// [`DomainError::AlreadyResolved`](crate::domain::error::DomainError::AlreadyResolved)
    /// when the id belongs to a resolved market.
    async fn upsert_market(&self, market: &NewMarket) -> Result<()>;

    /// Get a market by ID.
    async fn get(&self, id: &MarketId) -> Result<Option<Market>>;

    /// All pending markets, earliest deadline first (ties by id).
    async fn list_pending(&self) -> Result<Vec<Market>>;

    /// Every market, earliest deadline first.
    async fn list_all(&self) -> Result<Vec<Market>>;

    /// Transition a market to resolved.
    ///
    /// No-op when the market is missing or already resolved, so a crash
    /// between confirmation and this write can be retried safely.
    async fn mark_resolved(&self, id: &MarketId) -> Result<()>;

    /// Overwrite the synced stake totals. Leaves the status untouched and
    /// applies to resolved markets too. No-op when the market is missing.
    async fn update_stats(&self, id: &MarketId, stats: &PoolStats) -> Result<()>;
}

/// Append-only journal of submission attempts.
#[async_trait]
pub trait SubmissionJournal: Send + Sync {
    /// Append a phase record.
    async fn record(&self, attempt: &SubmissionAttempt) -> Result<()>;

    /// Most recent record for a market and program function.
    async fn latest(&self, market_id: &MarketId, function: &str)
        -> Result<Option<SubmissionAttempt>>;
}
