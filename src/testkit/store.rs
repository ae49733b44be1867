//! In-memory market store and submission journal.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::error::DomainError;
use crate::domain::{Market, MarketId, MarketStatus, NewMarket, PoolStats, SubmissionAttempt};
use crate::error::{Result, StorageError};
use crate::port::outbound::store::{MarketStore, SubmissionJournal};

/// Store with the same semantics as the SQLite adapter, kept in memory.
///
/// [`set_broken`](Self::set_broken) makes every call fail with a storage
/// error, for testing fatal propagation.
#[derive(Default)]
pub struct MemoryStore {
    markets: Mutex<BTreeMap<MarketId, Market>>,
    attempts: Mutex<Vec<SubmissionAttempt>>,
    broken: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }

    /// Every journal record, oldest first.
    pub fn attempts(&self) -> Vec<SubmissionAttempt> {
        self.attempts.lock().clone()
    }

    /// Status of a market, if present.
    pub fn status(&self, id: &str) -> Option<MarketStatus> {
        self.markets
            .lock()
            .get(&MarketId::from(id))
            .map(|m| m.status)
    }

    fn check(&self) -> Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(StorageError::Query("disk I/O error".into()).into());
        }
        Ok(())
    }

    fn sorted(&self, filter: impl Fn(&Market) -> bool) -> Vec<Market> {
        let mut markets: Vec<Market> = self
            .markets
            .lock()
            .values()
            .filter(|m| filter(m))
            .cloned()
            .collect();
        markets.sort_by(|a, b| a.deadline.cmp(&b.deadline).then_with(|| a.id.cmp(&b.id)));
        markets
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn initialize(&self) -> Result<()> {
        self.check()
    }

    async fn upsert_market(&self, market: &NewMarket) -> Result<()> {
        self.check()?;
        let mut markets = self.markets.lock();
        let stats = match markets.get(&market.id) {
            Some(existing) if existing.is_resolved() => {
                return Err(DomainError::AlreadyResolved(market.id.clone()).into());
            }
            Some(existing) => existing.stats,
            None => PoolStats::default(),
        };
        let mut replacement = market.clone().into_market();
        replacement.stats = stats;
        markets.insert(market.id.clone(), replacement);
        Ok(())
    }

    async fn get(&self, id: &MarketId) -> Result<Option<Market>> {
        self.check()?;
        Ok(self.markets.lock().get(id).cloned())
    }

    async fn list_pending(&self) -> Result<Vec<Market>> {
        self.check()?;
        Ok(self.sorted(|m| m.status == MarketStatus::Pending))
    }

    async fn list_all(&self) -> Result<Vec<Market>> {
        self.check()?;
        Ok(self.sorted(|_| true))
    }

    async fn mark_resolved(&self, id: &MarketId) -> Result<()> {
        self.check()?;
        if let Some(market) = self.markets.lock().get_mut(id) {
            market.status = MarketStatus::Resolved;
        }
        Ok(())
    }

    async fn update_stats(&self, id: &MarketId, stats: &PoolStats) -> Result<()> {
        self.check()?;
        if let Some(market) = self.markets.lock().get_mut(id) {
            market.stats = *stats;
        }
        Ok(())
    }
}

#[async_trait]
impl SubmissionJournal for MemoryStore {
    async fn record(&self, attempt: &SubmissionAttempt) -> Result<()> {
        self.check()?;
        self.attempts.lock().push(attempt.clone());
        Ok(())
    }

    async fn latest(
        &self,
        market_id: &MarketId,
        function: &str,
    ) -> Result<Option<SubmissionAttempt>> {
        self.check()?;
        Ok(self
            .attempts
            .lock()
            .iter()
            .rev()
            .find(|a| &a.market_id == market_id && a.function == function)
            .cloned())
    }
}
