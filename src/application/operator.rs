//! Operator service backing the CLI.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::metric::MetricRegistry;
use super::submitter::{Reconciliation, ResolutionSubmitter, SubmissionResult};
use crate::domain::error::DomainError;
use crate::domain::{FieldLiteral, Market, MarketId, NewMarket, Observation, TransactionId, WinningOption};
use crate::error::{ConfigError, Error, Result};
use crate::port::inbound::operator::{CreateMarketRequest, CreatedMarket, OracleOperator};
use crate::port::outbound::store::MarketStore;

/// Manual operations over the same store, registry and submitter the
/// scheduler uses.
pub struct OperatorService {
    store: Arc<dyn MarketStore>,
    registry: Arc<MetricRegistry>,
    submitter: Arc<ResolutionSubmitter>,
}

impl OperatorService {
    pub fn new(
        store: Arc<dyn MarketStore>,
        registry: Arc<MetricRegistry>,
        submitter: Arc<ResolutionSubmitter>,
    ) -> Self {
        Self {
            store,
            registry,
            submitter,
        }
    }

    fn unknown_metric(&self, name: &str) -> Error {
        ConfigError::InvalidValue {
            field: "metric",
            reason: format!(
                "no provider registered for {name} (known: {})",
                self.registry.names().join(", ")
            ),
        }
        .into()
    }
}

fn into_transaction(result: SubmissionResult) -> Result<TransactionId> {
    match result {
        SubmissionResult::Accepted(id) => Ok(id),
        SubmissionResult::Rejected(rejection) => Err(Error::Rejected(rejection.to_string())),
        SubmissionResult::ConfigError(reason) => Err(ConfigError::LedgerUnavailable(reason).into()),
    }
}

#[async_trait]
impl OracleOperator for OperatorService {
    async fn resolve_market(
        &self,
        id: &MarketId,
        option: WinningOption,
    ) -> Result<TransactionId> {
        match self.store.get(id).await? {
            Some(market) if market.is_resolved() => {
                return Err(DomainError::AlreadyResolved(id.clone()).into());
            }
            Some(_) => {}
            None => warn!(market_id = %id, "Market not registered locally, resolving on-chain only"),
        }

        match self.submitter.reconcile(id).await? {
            Reconciliation::Confirmed(transaction_id) => {
                self.store.mark_resolved(id).await?;
                info!(market_id = %id, transaction_id = %transaction_id, "Earlier resolution found on network, not resubmitting");
                return Ok(transaction_id);
            }
            Reconciliation::InDoubt(reason) => return Err(Error::InDoubt(reason)),
            Reconciliation::Clear => {}
        }

        let transaction_id = into_transaction(self.submitter.resolve(id, option).await?)?;
        self.store.mark_resolved(id).await?;
        info!(market_id = %id, winning_option = %option, transaction_id = %transaction_id, "Market resolved manually");
        Ok(transaction_id)
    }

    async fn create_market(&self, request: &CreateMarketRequest) -> Result<CreatedMarket> {
        let metric = request.metric.as_str();
        if !self.registry.contains(metric) {
            return Err(self.unknown_metric(metric));
        }
        let title = FieldLiteral::from_text(&request.title)?;
        let snapshot_time = request.snapshot_time;
        let deadline = i64::try_from(snapshot_time).map_err(|_| ConfigError::InvalidValue {
            field: "snapshot_time",
            reason: format!("{snapshot_time} is out of range"),
        })?;
        let threshold = request.threshold;
        let registration = NewMarket::try_new(title.as_str(), deadline, threshold, metric)?
            .with_description(request.description.as_str())
            .with_labels(request.option_a.as_str(), request.option_b.as_str())?;

        if let Some(existing) = self.store.get(&registration.id).await? {
            if existing.is_resolved() {
                return Err(DomainError::AlreadyResolved(registration.id).into());
            }
        }

        let transaction_id =
            into_transaction(self.submitter.create_pool(&title, snapshot_time).await?)?;
        self.store.upsert_market(&registration).await?;
        info!(
            market_id = %registration.id,
            deadline,
            threshold,
            metric,
            transaction_id = %transaction_id,
            "Market created"
        );

        Ok(CreatedMarket {
            market: registration.into_market(),
            transaction_id,
        })
    }

    async fn list_markets(&self, include_resolved: bool) -> Result<Vec<Market>> {
        if include_resolved {
            self.store.list_all().await
        } else {
            self.store.list_pending().await
        }
    }

    fn metric_names(&self) -> Vec<String> {
        self.registry.names()
    }

    async fn sample_metric(&self, name: &str) -> Result<Observation> {
        let provider = self.registry.get(name).ok_or_else(|| self.unknown_metric(name))?;
        let value = provider.fetch_value().await?;
        Ok(Observation {
            provider: provider.name().to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MarketStatus;
    use crate::error::BroadcastError;
    use crate::port::outbound::ledger::Credential;
    use crate::testkit::config::submitter_settings;
    use crate::testkit::ledger::{RecordingLedger, ScriptedBroadcaster};
    use crate::testkit::market;
    use crate::testkit::metric::FixedMetric;
    use crate::testkit::store::MemoryStore;

    fn service_with(
        broadcaster: ScriptedBroadcaster,
        credential: Option<Credential>,
    ) -> (Arc<MemoryStore>, Arc<RecordingLedger>, OperatorService) {
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(RecordingLedger::new());
        let settings = crate::application::submitter::SubmitterSettings {
            credential,
            ..submitter_settings()
        };
        let submitter = Arc::new(ResolutionSubmitter::new(
            ledger.clone(),
            Arc::new(broadcaster),
            store.clone(),
            settings,
        ));
        let registry = Arc::new(
            MetricRegistry::new().with(Arc::new(FixedMetric::new("eth_staking_rate", 28.5))),
        );
        let service = OperatorService::new(store.clone(), registry, submitter);
        (store, ledger, service)
    }

    fn service() -> (Arc<MemoryStore>, Arc<RecordingLedger>, OperatorService) {
        service_with(ScriptedBroadcaster::accepting(), submitter_settings().credential)
    }

    #[tokio::test]
    async fn manual_resolution_marks_market_resolved() {
        let (store, _, service) = service();
        store.upsert_market(&market("5field", 100, 1.0, "eth_staking_rate")).await.unwrap();

        let tx = service
            .resolve_market(&MarketId::from("5field"), WinningOption::No)
            .await
            .unwrap();

        assert!(tx.as_str().starts_with("at1"));
        assert_eq!(store.status("5field"), Some(MarketStatus::Resolved));
    }

    #[tokio::test]
    async fn manual_resolution_refuses_resolved_market() {
        let (store, ledger, service) = service();
        store.upsert_market(&market("5field", 100, 1.0, "eth_staking_rate")).await.unwrap();
        store.mark_resolved(&MarketId::from("5field")).await.unwrap();

        let err = service
            .resolve_market(&MarketId::from("5field"), WinningOption::Yes)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Domain(DomainError::AlreadyResolved(_))));
        assert!(ledger.calls().is_empty());
    }

    #[tokio::test]
    async fn rejected_resolution_leaves_market_pending() {
        let (store, _, service) = service_with(
            ScriptedBroadcaster::rejecting(400, "bad request"),
            submitter_settings().credential,
        );
        store.upsert_market(&market("5field", 100, 1.0, "eth_staking_rate")).await.unwrap();

        let err = service
            .resolve_market(&MarketId::from("5field"), WinningOption::Yes)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Rejected(_)));
        assert_eq!(store.status("5field"), Some(MarketStatus::Pending));
    }

    #[tokio::test]
    async fn missing_credential_surfaces_as_config_error() {
        let (_, _, service) = service_with(ScriptedBroadcaster::accepting(), None);

        let err = service
            .resolve_market(&MarketId::from("5field"), WinningOption::Yes)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Config(ConfigError::LedgerUnavailable(_))));
    }

    #[tokio::test]
    async fn create_market_registers_after_acceptance() {
        let (store, ledger, service) = service();

        let created = service
            .create_market(&CreateMarketRequest::new("42field", 4.0, 1_800_000_000, "eth_staking_rate"))
            .await
            .unwrap();

        assert_eq!(created.market.id.as_str(), "42field");
        assert_eq!(created.market.option_a_label, "YES");
        assert_eq!(created.market.status, MarketStatus::Pending);
        assert_eq!(ledger.calls()[0].inputs[0], "42field");
        let stored = store.get(&MarketId::from("42field")).await.unwrap().unwrap();
        assert_eq!(stored.deadline, 1_800_000_000);
        assert!((stored.threshold - 4.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn create_market_rejects_unknown_metric() {
        let (store, ledger, service) = service();

        let err = service
            .create_market(&CreateMarketRequest::new("42field", 4.0, 1_800_000_000, "tvl"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { field: "metric", .. })));
        assert!(ledger.calls().is_empty());
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_creation_registers_nothing() {
        let (store, _, service) = service_with(
            ScriptedBroadcaster::rejecting(503, ""),
            submitter_settings().credential,
        );

        let result = service
            .create_market(&CreateMarketRequest::new("42field", 4.0, 1_800_000_000, "eth_staking_rate"))
            .await;

        assert!(result.is_err());
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_market_stores_description_and_labels() {
        let (store, ledger, service) = service();
        let request = CreateMarketRequest {
            description: "Will ETH staking APR stay above 4%?".into(),
            option_a: "Above".into(),
            option_b: "Below".into(),
            ..CreateMarketRequest::new("42field", 4.0, 1_800_000_000, "eth_staking_rate")
        };

        service.create_market(&request).await.unwrap();

        let stored = store.get(&MarketId::from("42field")).await.unwrap().unwrap();
        assert_eq!(stored.description, "Will ETH staking APR stay above 4%?");
        assert_eq!(stored.option_a_label, "Above");
        assert_eq!(stored.option_b_label, "Below");
        // Labels are off-chain only.
        assert_eq!(ledger.calls()[0].inputs[1], "0field");
    }

    #[tokio::test]
    async fn blank_label_is_refused_before_submitting() {
        let (store, ledger, service) = service();
        let request = CreateMarketRequest {
            option_b: String::new(),
            ..CreateMarketRequest::new("42field", 4.0, 1_800_000_000, "eth_staking_rate")
        };

        let err = service.create_market(&request).await.unwrap_err();

        assert!(matches!(err, Error::Domain(DomainError::EmptyLabel)));
        assert!(ledger.calls().is_empty());
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn manual_resolution_reuses_accepted_attempt() {
        let (store, ledger, service) = service();
        let id = MarketId::from("5field");
        store.upsert_market(&market("5field", 100, 1.0, "eth_staking_rate")).await.unwrap();
        // Accepted on-chain, but the process died before mark_resolved.
        let earlier = service.submitter.resolve(&id, WinningOption::Yes).await.unwrap();
        let SubmissionResult::Accepted(earlier) = earlier else {
            panic!("expected acceptance");
        };

        let tx = service.resolve_market(&id, WinningOption::Yes).await.unwrap();

        assert_eq!(tx, earlier);
        assert_eq!(ledger.calls().len(), 1);
        assert_eq!(store.status("5field"), Some(MarketStatus::Resolved));
    }

    #[tokio::test]
    async fn manual_resolution_refuses_unverified_broadcast() {
        let broadcaster = ScriptedBroadcaster::unreachable();
        broadcaster.fail_lookups(BroadcastError::Transport("timeout".into()));
        let (store, ledger, service) =
            service_with(broadcaster, submitter_settings().credential);
        let id = MarketId::from("5field");
        store.upsert_market(&market("5field", 100, 1.0, "eth_staking_rate")).await.unwrap();
        // POST failed in transport, leaving the attempt in `broadcasting`.
        assert!(service.resolve_market(&id, WinningOption::Yes).await.is_err());

        let err = service
            .resolve_market(&id, WinningOption::Yes)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InDoubt(_)));
        assert_eq!(ledger.calls().len(), 1);
        assert_eq!(store.status("5field"), Some(MarketStatus::Pending));
    }

    #[tokio::test]
    async fn sample_metric_reads_provider() {
        let (_, _, service) = service();
        let observation = service.sample_metric("eth_staking_rate").await.unwrap();
        assert_eq!(observation.provider, "eth_staking_rate");
        assert!((observation.value - 28.5).abs() < f64::EPSILON);
        assert!(service.sample_metric("unknown").await.is_err());
    }
}
