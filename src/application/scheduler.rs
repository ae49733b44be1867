//! Poll loop that resolves due markets.
//!
//! Each cycle first mirrors on-chain stake totals into the store (when a
//! stats source is attached), then scans pending markets, and for every due
//! one: reconciles any earlier attempt, fetches the metric, applies the
//! outcome rule and submits. Provider, node and ledger failures skip the
//! market until the next cycle. Storage failures end the cycle and
//! propagate.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::metric::MetricRegistry;
use super::submitter::{Reconciliation, ResolutionSubmitter, SubmissionResult};
use crate::domain::{FieldLiteral, Market, MarketId, Observation, TransactionId, WinningOption};
use crate::error::Result;
use crate::port::outbound::ledger::PoolStatsSource;
use crate::port::outbound::store::MarketStore;

/// Scheduler timing and alerting.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Sleep between cycles.
    pub poll_interval: Duration,
    /// Consecutive failed cycles after which a market raises an alert.
    pub failure_alert_threshold: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            failure_alert_threshold: 10,
        }
    }
}

/// What happened to one due market in one cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketOutcome {
    /// Submission accepted and the market marked resolved.
    Resolved {
        option: WinningOption,
        value: f64,
        transaction_id: TransactionId,
    },
    /// An earlier accepted attempt was found; marked resolved without resubmitting.
    Recovered { transaction_id: TransactionId },
    /// No provider registered for the market's metric type.
    UnknownMetric(String),
    FetchFailed(String),
    /// Ledger or broadcast rejected the submission.
    Rejected(String),
    /// Credential or endpoint missing.
    ConfigError(String),
    /// An earlier broadcast could not be checked; nothing was submitted.
    InDoubt(String),
}

impl MarketOutcome {
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. } | Self::Recovered { .. })
    }
}

impl fmt::Display for MarketOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved {
                option,
                transaction_id,
                ..
            } => write!(f, "resolved {option} ({transaction_id})"),
            Self::Recovered { transaction_id } => write!(f, "recovered ({transaction_id})"),
            Self::UnknownMetric(name) => write!(f, "no provider for metric {name}"),
            Self::FetchFailed(reason) => write!(f, "fetch failed: {reason}"),
            Self::Rejected(reason) => write!(f, "rejected: {reason}"),
            Self::ConfigError(reason) => write!(f, "config error: {reason}"),
            Self::InDoubt(reason) => write!(f, "in doubt: {reason}"),
        }
    }
}

/// Summary of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Markets whose stake totals changed this cycle.
    pub stats_updated: usize,
    /// Pending markets seen.
    pub scanned: usize,
    /// Outcome per due market, in processing order.
    pub outcomes: Vec<(MarketId, MarketOutcome)>,
}

impl CycleReport {
    #[must_use]
    pub fn due(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn resolved(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_resolved()).count()
    }

    /// Outcome for a market, if it was due this cycle.
    #[must_use]
    pub fn outcome(&self, id: &str) -> Option<&MarketOutcome> {
        self.outcomes
            .iter()
            .find(|(market_id, _)| market_id.as_str() == id)
            .map(|(_, outcome)| outcome)
    }
}

/// Single sequential poll loop. Run exactly one per market store.
pub struct Scheduler {
    store: Arc<dyn MarketStore>,
    registry: Arc<MetricRegistry>,
    submitter: Arc<ResolutionSubmitter>,
    stats: Option<Arc<dyn PoolStatsSource>>,
    config: SchedulerConfig,
    failures: Mutex<HashMap<MarketId, u32>>,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn MarketStore>,
        registry: Arc<MetricRegistry>,
        submitter: Arc<ResolutionSubmitter>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            registry,
            submitter,
            stats: None,
            config,
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Mirror each market's `pools` entry into the store every cycle.
    #[must_use]
    pub fn with_stats_source(mut self, source: Arc<dyn PoolStatsSource>) -> Self {
        self.stats = Some(source);
        self
    }

    /// Initialize the store, then poll until a storage error occurs.
    ///
    /// # Errors
    ///
    /// Storage failures. Everything else is retried on the next cycle.
    pub async fn run(&self) -> Result<()> {
        self.store.initialize().await?;
        info!(
            interval_secs = self.config.poll_interval.as_secs(),
            metrics = ?self.registry.names(),
            "Oracle worker started"
        );

        loop {
            let now = chrono::Utc::now().timestamp();
            let report = self.run_cycle(now).await.inspect_err(|e| {
                error!(error = %e, "Storage failure, stopping worker");
            })?;
            if report.due() > 0 {
                info!(
                    scanned = report.scanned,
                    due = report.due(),
                    resolved = report.resolved(),
                    "Poll cycle complete"
                );
            } else {
                debug!(scanned = report.scanned, "No markets due");
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Run one cycle at unix time `now`.
    ///
    /// # Errors
    ///
    /// Storage failures, which abort the cycle.
    pub async fn run_cycle(&self, now: i64) -> Result<CycleReport> {
        let stats_updated = self.sync_stats().await?;
        let pending = self.store.list_pending().await?;
        let mut report = CycleReport {
            stats_updated,
            scanned: pending.len(),
            outcomes: Vec::new(),
        };

        for market in pending.into_iter().filter(|m| m.is_due(now)) {
            let outcome = self.process(&market).await?;
            self.track(&market.id, &outcome);
            report.outcomes.push((market.id, outcome));
        }

        Ok(report)
    }

    /// Copy stake totals for every market, resolved ones included, since
    /// payouts keep moving after resolution. Returns how many changed.
    async fn sync_stats(&self) -> Result<usize> {
        let Some(source) = &self.stats else {
            return Ok(0);
        };
        let program_id = &self.submitter.settings().program_id;
        let mut updated = 0;

        for market in self.store.list_all().await? {
            let Ok(pool) = FieldLiteral::from_text(market.id.as_str()) else {
                continue;
            };
            match source.pool_stats(program_id, &pool).await {
                Ok(Some(stats)) if stats != market.stats => {
                    self.store.update_stats(&market.id, &stats).await?;
                    debug!(
                        market_id = %market.id,
                        total_staked = stats.total_staked,
                        option_a_stakes = stats.option_a_stakes,
                        option_b_stakes = stats.option_b_stakes,
                        "Pool stats updated"
                    );
                    updated += 1;
                }
                Ok(Some(_)) => {}
                Ok(None) => debug!(market_id = %market.id, "Pool not found on-chain"),
                Err(e) => warn!(market_id = %market.id, error = %e, "Pool stats sync failed"),
            }
        }

        Ok(updated)
    }

    async fn process(&self, market: &Market) -> Result<MarketOutcome> {
        let id = &market.id;

        match self.submitter.reconcile(id).await? {
            Reconciliation::Confirmed(transaction_id) => {
                self.store.mark_resolved(id).await?;
                info!(market_id = %id, transaction_id = %transaction_id, "Market resolved from earlier attempt");
                return Ok(MarketOutcome::Recovered { transaction_id });
            }
            Reconciliation::InDoubt(reason) => {
                warn!(market_id = %id, reason = %reason, "Earlier broadcast unverified, skipping");
                return Ok(MarketOutcome::InDoubt(reason));
            }
            Reconciliation::Clear => {}
        }

        let Some(provider) = self.registry.get(&market.metric_type) else {
            warn!(market_id = %id, metric = %market.metric_type, "No provider registered, skipping");
            return Ok(MarketOutcome::UnknownMetric(market.metric_type.clone()));
        };

        let value = match provider.fetch_value().await {
            Ok(value) if value.is_finite() => value,
            Ok(value) => {
                warn!(market_id = %id, metric = %market.metric_type, value, "Non-finite observation, skipping");
                return Ok(MarketOutcome::FetchFailed(format!(
                    "non-finite observation {value}"
                )));
            }
            Err(e) => {
                warn!(market_id = %id, metric = %market.metric_type, error = %e, "Metric fetch failed, skipping");
                return Ok(MarketOutcome::FetchFailed(e.to_string()));
            }
        };

        let observation = Observation {
            provider: provider.name().to_string(),
            value,
        };
        let option = observation.outcome(market.threshold);
        info!(
            market_id = %id,
            metric = %observation.provider,
            value,
            threshold = market.threshold,
            winning_option = %option,
            "Submitting resolution"
        );

        match self.submitter.resolve(id, option).await? {
            SubmissionResult::Accepted(transaction_id) => {
                self.store.mark_resolved(id).await?;
                info!(market_id = %id, transaction_id = %transaction_id, winning_option = %option, "Market resolved");
                Ok(MarketOutcome::Resolved {
                    option,
                    value,
                    transaction_id,
                })
            }
            SubmissionResult::Rejected(rejection) => {
                warn!(market_id = %id, reason = %rejection, "Resolution rejected, will retry");
                Ok(MarketOutcome::Rejected(rejection.to_string()))
            }
            SubmissionResult::ConfigError(reason) => {
                error!(market_id = %id, reason = %reason, "Ledger not configured, skipping submission");
                Ok(MarketOutcome::ConfigError(reason))
            }
        }
    }

    /// Update the consecutive failure count and alert once at the threshold.
    fn track(&self, id: &MarketId, outcome: &MarketOutcome) {
        let mut failures = self.failures.lock();
        if outcome.is_resolved() {
            failures.remove(id);
            return;
        }
        let count = failures.entry(id.clone()).or_insert(0);
        *count += 1;
        if *count == self.config.failure_alert_threshold {
            error!(
                market_id = %id,
                consecutive_failures = *count,
                last_outcome = %outcome,
                "Market repeatedly failing to resolve"
            );
        }
    }

    /// Consecutive failed cycles for a market.
    #[must_use]
    pub fn failure_count(&self, id: &MarketId) -> u32 {
        self.failures.lock().get(id).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::submitter::SubmitterSettings;
    use crate::error::{BroadcastError, Error, LedgerError, StorageError};
    use crate::testkit::config::{scheduler, submitter_settings};
    use crate::domain::{MarketStatus, PoolStats};
    use crate::testkit::ledger::{
        BroadcastOutcome, LedgerPhase, RecordingLedger, ScriptedBroadcaster, ScriptedPools,
    };
    use crate::testkit::market;
    use crate::testkit::metric::{FailingMetric, FixedMetric, ScriptedMetric};
    use crate::testkit::store::MemoryStore;

    const NOW: i64 = 1_700_000_000;

    struct Harness {
        store: Arc<MemoryStore>,
        ledger: Arc<RecordingLedger>,
        broadcaster: Arc<ScriptedBroadcaster>,
        scheduler: Scheduler,
    }

    fn harness(registry: MetricRegistry, broadcaster: ScriptedBroadcaster) -> Harness {
        harness_with(registry, broadcaster, RecordingLedger::new(), submitter_settings())
    }

    fn harness_with(
        registry: MetricRegistry,
        broadcaster: ScriptedBroadcaster,
        ledger: RecordingLedger,
        settings: SubmitterSettings,
    ) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(ledger);
        let broadcaster = Arc::new(broadcaster);
        let submitter = Arc::new(ResolutionSubmitter::new(
            ledger.clone(),
            broadcaster.clone(),
            store.clone(),
            settings,
        ));
        let scheduler = Scheduler::new(store.clone(), Arc::new(registry), submitter, scheduler(3));
        Harness {
            store,
            ledger,
            broadcaster,
            scheduler,
        }
    }

    #[tokio::test]
    async fn markets_are_processed_earliest_deadline_first() {
        let h = harness(
            MetricRegistry::new().with(Arc::new(FixedMetric::new("eth_price", 10.0))),
            ScriptedBroadcaster::accepting(),
        );
        h.store.upsert_market(&market("20field", NOW - 10, 1.0, "eth_price")).await.unwrap();
        h.store.upsert_market(&market("10field", NOW - 50, 1.0, "eth_price")).await.unwrap();

        let report = h.scheduler.run_cycle(NOW).await.unwrap();

        let order: Vec<&str> = report.outcomes.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order, vec!["10field", "20field"]);
        assert_eq!(report.resolved(), 2);
    }

    #[tokio::test]
    async fn resolved_markets_are_not_rescanned() {
        let metric = Arc::new(FixedMetric::new("eth_price", 10.0));
        let h = harness(
            MetricRegistry::new().with(metric.clone()),
            ScriptedBroadcaster::accepting(),
        );
        h.store.upsert_market(&market("1field", NOW - 1, 5.0, "eth_price")).await.unwrap();

        h.scheduler.run_cycle(NOW).await.unwrap();
        let second = h.scheduler.run_cycle(NOW + 60).await.unwrap();

        assert_eq!(second.scanned, 0);
        assert_eq!(metric.calls(), 1);
        assert_eq!(h.ledger.calls().len(), 1);
    }

    #[tokio::test]
    async fn rejected_submission_is_retried_next_cycle() {
        let h = harness(
            MetricRegistry::new().with(Arc::new(FixedMetric::new("eth_price", 10.0))),
            ScriptedBroadcaster::rejecting(500, "node busy"),
        );
        h.store.upsert_market(&market("1field", NOW - 1, 5.0, "eth_price")).await.unwrap();

        let first = h.scheduler.run_cycle(NOW).await.unwrap();
        assert!(matches!(first.outcome("1field"), Some(MarketOutcome::Rejected(_))));
        assert_eq!(h.store.status("1field"), Some(MarketStatus::Pending));

        h.broadcaster.set(BroadcastOutcome::Accept);
        let second = h.scheduler.run_cycle(NOW + 60).await.unwrap();
        assert!(matches!(second.outcome("1field"), Some(MarketOutcome::Resolved { .. })));
        assert_eq!(h.store.status("1field"), Some(MarketStatus::Resolved));
    }

    #[tokio::test]
    async fn one_failing_market_does_not_block_others() {
        let h = harness(
            MetricRegistry::new()
                .with(Arc::new(FailingMetric::new("fear_greed")))
                .with(Arc::new(FixedMetric::new("eth_price", 10.0))),
            ScriptedBroadcaster::accepting(),
        );
        h.store.upsert_market(&market("1field", NOW - 100, 50.0, "fear_greed")).await.unwrap();
        h.store.upsert_market(&market("2field", NOW - 50, 5.0, "eth_price")).await.unwrap();

        let report = h.scheduler.run_cycle(NOW).await.unwrap();

        assert!(matches!(report.outcome("1field"), Some(MarketOutcome::FetchFailed(_))));
        assert!(matches!(report.outcome("2field"), Some(MarketOutcome::Resolved { .. })));
    }

    #[tokio::test]
    async fn non_finite_observation_is_not_submitted() {
        let h = harness(
            MetricRegistry::new().with(Arc::new(ScriptedMetric::new("eth_price", vec![Ok(f64::NAN)]))),
            ScriptedBroadcaster::accepting(),
        );
        h.store.upsert_market(&market("1field", NOW - 1, 5.0, "eth_price")).await.unwrap();

        let report = h.scheduler.run_cycle(NOW).await.unwrap();

        assert!(matches!(report.outcome("1field"), Some(MarketOutcome::FetchFailed(_))));
        assert!(h.ledger.calls().is_empty());
    }

    #[tokio::test]
    async fn accepted_attempt_in_journal_is_not_resubmitted() {
        let h = harness(
            MetricRegistry::new().with(Arc::new(FixedMetric::new("eth_price", 10.0))),
            ScriptedBroadcaster::accepting(),
        );
        let id = MarketId::from("1field");
        h.store.upsert_market(&market("1field", NOW - 1, 5.0, "eth_price")).await.unwrap();
        // Crash between acceptance and mark_resolved.
        h.scheduler.submitter.resolve(&id, WinningOption::Yes).await.unwrap();

        let report = h.scheduler.run_cycle(NOW).await.unwrap();

        assert!(matches!(report.outcome("1field"), Some(MarketOutcome::Recovered { .. })));
        assert_eq!(h.ledger.calls().len(), 1);
        assert_eq!(h.store.status("1field"), Some(MarketStatus::Resolved));
    }

    #[tokio::test]
    async fn unverifiable_broadcast_skips_market() {
        let h = harness(
            MetricRegistry::new().with(Arc::new(FixedMetric::new("eth_price", 10.0))),
            ScriptedBroadcaster::unreachable(),
        );
        h.store.upsert_market(&market("1field", NOW - 1, 5.0, "eth_price")).await.unwrap();
        h.scheduler.run_cycle(NOW).await.unwrap();
        h.broadcaster
            .fail_lookups(BroadcastError::Transport("timeout".into()));

        let report = h.scheduler.run_cycle(NOW + 60).await.unwrap();

        assert!(matches!(report.outcome("1field"), Some(MarketOutcome::InDoubt(_))));
        assert_eq!(h.broadcaster.broadcasts().len(), 1);
    }

    #[tokio::test]
    async fn failure_counter_resets_on_success() {
        let metric = Arc::new(ScriptedMetric::new(
            "eth_price",
            vec![
                Err(crate::error::ProviderError::Http {
                    provider: "fake",
                    message: "down".into(),
                }),
                Err(crate::error::ProviderError::Http {
                    provider: "fake",
                    message: "down".into(),
                }),
                Ok(10.0),
            ],
        ));
        let h = harness(
            MetricRegistry::new().with(metric),
            ScriptedBroadcaster::accepting(),
        );
        let id = MarketId::from("1field");
        h.store.upsert_market(&market("1field", NOW - 1, 5.0, "eth_price")).await.unwrap();

        h.scheduler.run_cycle(NOW).await.unwrap();
        h.scheduler.run_cycle(NOW + 60).await.unwrap();
        assert_eq!(h.scheduler.failure_count(&id), 2);

        h.scheduler.run_cycle(NOW + 120).await.unwrap();
        assert_eq!(h.scheduler.failure_count(&id), 0);
    }

    #[tokio::test]
    async fn storage_failure_propagates() {
        let h = harness(MetricRegistry::new(), ScriptedBroadcaster::accepting());
        h.store.set_broken(true);

        let err = h.scheduler.run_cycle(NOW).await.unwrap_err();

        assert!(matches!(err, Error::Storage(StorageError::Query(_))));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn missing_credential_leaves_market_pending() {
        let h = harness_with(
            MetricRegistry::new().with(Arc::new(FixedMetric::new("eth_price", 10.0))),
            ScriptedBroadcaster::accepting(),
            RecordingLedger::new(),
            SubmitterSettings {
                credential: None,
                ..submitter_settings()
            },
        );
        let id = MarketId::from("1field");
        h.store.upsert_market(&market("1field", NOW - 1, 5.0, "eth_price")).await.unwrap();

        let report = h.scheduler.run_cycle(NOW).await.unwrap();

        assert!(matches!(report.outcome("1field"), Some(MarketOutcome::ConfigError(_))));
        assert_eq!(h.store.status("1field"), Some(MarketStatus::Pending));
        assert!(h.ledger.calls().is_empty());
        assert_eq!(h.scheduler.failure_count(&id), 1);
    }

    #[tokio::test]
    async fn ledger_failure_leaves_market_pending() {
        let h = harness_with(
            MetricRegistry::new().with(Arc::new(FixedMetric::new("eth_price", 10.0))),
            ScriptedBroadcaster::accepting(),
            RecordingLedger::new().failing_at(LedgerPhase::Execute, LedgerError::Execution("boom".into())),
            submitter_settings(),
        );
        h.store.upsert_market(&market("1field", NOW - 1, 5.0, "eth_price")).await.unwrap();

        let report = h.scheduler.run_cycle(NOW).await.unwrap();

        let Some(MarketOutcome::Rejected(reason)) = report.outcome("1field") else {
            panic!("expected rejection, got {:?}", report.outcome("1field"));
        };
        assert!(reason.contains("boom"));
        assert_eq!(h.store.status("1field"), Some(MarketStatus::Pending));
        assert!(h.broadcaster.broadcasts().is_empty());
    }

    #[tokio::test]
    async fn stats_are_synced_for_every_market() {
        let stats = PoolStats {
            total_staked: 300,
            option_a_stakes: 200,
            option_b_stakes: 100,
        };
        let pools = Arc::new(ScriptedPools::new());
        pools.set("1field", stats);
        pools.set("2field", stats);
        let h = harness(MetricRegistry::new(), ScriptedBroadcaster::accepting());
        let scheduler = h.scheduler.with_stats_source(pools.clone());
        h.store.upsert_market(&market("1field", NOW + 600, 5.0, "eth_price")).await.unwrap();
        h.store.upsert_market(&market("2field", NOW - 600, 5.0, "eth_price")).await.unwrap();
        h.store.mark_resolved(&MarketId::from("2field")).await.unwrap();

        let first = scheduler.run_cycle(NOW).await.unwrap();
        let second = scheduler.run_cycle(NOW + 60).await.unwrap();

        assert_eq!(first.stats_updated, 2);
        assert_eq!(second.stats_updated, 0);
        for id in ["1field", "2field"] {
            let m = h.store.get(&MarketId::from(id)).await.unwrap().unwrap();
            assert_eq!(m.stats, stats);
        }
        assert_eq!(h.store.status("2field"), Some(MarketStatus::Resolved));
        assert_eq!(pools.program_ids(), vec!["prediction.aleo"; 4]);
    }

    #[tokio::test]
    async fn stats_failure_does_not_block_resolution() {
        let pools = Arc::new(ScriptedPools::new());
        pools.fail(BroadcastError::Transport("connection refused".into()));
        let h = harness(
            MetricRegistry::new().with(Arc::new(FixedMetric::new("eth_price", 10.0))),
            ScriptedBroadcaster::accepting(),
        );
        let scheduler = h.scheduler.with_stats_source(pools);
        h.store.upsert_market(&market("1field", NOW - 1, 5.0, "eth_price")).await.unwrap();

        let report = scheduler.run_cycle(NOW).await.unwrap();

        assert_eq!(report.stats_updated, 0);
        assert!(matches!(report.outcome("1field"), Some(MarketOutcome::Resolved { .. })));
    }
}
