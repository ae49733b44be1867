//! Infrastructure bootstrap helpers for runtime wiring.
//!
//! Every concrete adapter is constructed here; the application layer only
//! sees ports.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::adapter::outbound::ledger::{HttpBroadcaster, SidecarLedgerClient};
use crate::adapter::outbound::metric::{
    BtcDominance, EthGasPrice, EthStakingRate, FearGreedIndex, MetricHttp, SpotPrice,
};
use crate::adapter::outbound::sqlite::database::connection::{create_pool, DbPool};
use crate::adapter::outbound::sqlite::{SqliteMarketStore, SqliteSubmissionJournal};
use crate::application::metric::MetricRegistry;
use crate::application::operator::OperatorService;
use crate::application::scheduler::Scheduler;
use crate::application::submitter::ResolutionSubmitter;
use crate::error::Result;
use crate::infrastructure::config::metrics::MetricsConfig;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::ledger::PoolStatsSource;
use crate::port::outbound::metric::MetricProvider;
use crate::port::outbound::store::{MarketStore, SubmissionJournal};

/// Persistence handles sharing one connection pool.
pub struct Storage {
    pub store: Arc<dyn MarketStore>,
    pub journal: Arc<dyn SubmissionJournal>,
}

/// Open the database and migrate it.
///
/// # Errors
/// Returns an error if the pool cannot be created or migrations fail.
pub async fn build_storage(config: &Config) -> Result<Storage> {
    let pool: DbPool = create_pool(&config.database)?;
    let store = SqliteMarketStore::new(pool.clone());
    store.initialize().await?;
    debug!(database = %config.database, "Database ready");

    Ok(Storage {
        store: Arc::new(store),
        journal: Arc::new(SqliteSubmissionJournal::new(pool)),
    })
}

/// Register every built-in metric provider.
#[must_use]
pub fn build_registry(config: &MetricsConfig) -> MetricRegistry {
    let http = MetricHttp::new(config.timeout());
    if config.etherscan_api_key.is_none() {
        warn!("ETHERSCAN_API_KEY not set; eth_staking_rate and eth_gas_price will fail");
    }

    let providers: Vec<Arc<dyn MetricProvider>> = vec![
        Arc::new(EthStakingRate::new(
            http.clone(),
            config.etherscan_url.clone(),
            config.beaconchain_url.clone(),
            config.etherscan_api_key.clone(),
        )),
        Arc::new(EthGasPrice::new(
            http.clone(),
            config.etherscan_url.clone(),
            config.etherscan_api_key.clone(),
        )),
        Arc::new(SpotPrice::eth_price(http.clone(), config.coingecko_url.clone())),
        Arc::new(SpotPrice::stablecoin_peg(
            http.clone(),
            config.coingecko_url.clone(),
        )),
        Arc::new(BtcDominance::new(http.clone(), config.coingecko_url.clone())),
        Arc::new(FearGreedIndex::new(http, config.fear_greed_url.clone())),
    ];

    let mut registry = MetricRegistry::new();
    for provider in providers {
        registry.register(provider);
    }
    registry
}

/// Ledger client, broadcaster and journal behind one submitter.
#[must_use]
pub fn build_submitter(config: &Config, journal: Arc<dyn SubmissionJournal>) -> ResolutionSubmitter {
    let ledger = &config.ledger;
    if ledger.credential.is_none() {
        warn!("ORACLE_PRIVATE_KEY not set; submissions will be refused");
    }
    if ledger.node_url.is_none() {
        warn!("Ledger node URL not set; submissions will be refused");
    }

    ResolutionSubmitter::new(
        Arc::new(SidecarLedgerClient::new(ledger.prover_url.clone())),
        Arc::new(node_client(config)),
        journal,
        ledger.submitter_settings(),
    )
}

fn node_client(config: &Config) -> HttpBroadcaster {
    let ledger = &config.ledger;
    HttpBroadcaster::new(
        ledger.node_url.clone(),
        ledger.network.clone(),
        ledger.broadcast_timeout(),
    )
}

/// Node client for the per-cycle stake sync, when enabled and a node is set.
#[must_use]
pub fn build_stats_source(config: &Config) -> Option<Arc<dyn PoolStatsSource>> {
    if !config.worker.sync_stats {
        debug!("Pool stats sync disabled");
        return None;
    }
    if config.ledger.node_url.is_none() {
        warn!("Ledger node URL not set; pool stats will not be synced");
        return None;
    }
    Some(Arc::new(node_client(config)))
}

/// Fully wired poll loop.
///
/// # Errors
/// Returns an error if storage cannot be opened.
pub async fn build_scheduler(config: &Config) -> Result<Scheduler> {
    let storage = build_storage(config).await?;
    let registry = Arc::new(build_registry(&config.metrics));
    let submitter = Arc::new(build_submitter(config, storage.journal));

    info!(
        program = %config.ledger.program_id,
        network = %config.ledger.network,
        providers = registry.len(),
        "Scheduler wired"
    );

    let scheduler = Scheduler::new(
        storage.store,
        registry,
        submitter,
        config.worker.scheduler_config(),
    );
    Ok(match build_stats_source(config) {
        Some(source) => scheduler.with_stats_source(source),
        None => scheduler,
    })
}

/// Operator service for one-shot CLI commands.
///
/// # Errors
/// Returns an error if storage cannot be opened.
pub async fn build_operator(config: &Config) -> Result<OperatorService> {
    let storage = build_storage(config).await?;
    let registry = Arc::new(build_registry(&config.metrics));
    let submitter = Arc::new(build_submitter(config, storage.journal));
    Ok(OperatorService::new(storage.store, registry, submitter))
}
