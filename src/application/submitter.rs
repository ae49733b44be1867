//! Resolution submitter.
//!
//! Drives the ledger client through authorize, execute/prove, fee and
//! broadcast for a single program call. Never touches the market store;
//! the only persistence it performs is the submission journal, which lets
//! the scheduler detect an attempt whose broadcast outcome is unknown.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::{
    FieldLiteral, MarketId, ProgramCall, SubmissionAttempt, SubmissionPhase, TransactionId,
    WinningOption, RESOLVE_POOL,
};
use crate::error::{LedgerError, Result};
use crate::port::outbound::ledger::{
    Credential, Execution, Fee, LedgerClient, TransactionBroadcaster,
};
use crate::port::outbound::store::SubmissionJournal;

/// Ledger settings the submitter needs for every call.
#[derive(Debug, Clone)]
pub struct SubmitterSettings {
    pub program_id: String,
    /// Live network query endpoint used to prepare traces.
    pub query_endpoint: Option<String>,
    pub credential: Option<Credential>,
    /// Public fee for `resolve_pool`, in microcredits.
    pub resolve_fee: u64,
    /// Public fee for `create_pool`, in microcredits.
    pub create_fee: u64,
    /// Upper bound on the authorize/execute/prove phases.
    pub execution_timeout: Duration,
}

/// Why a submission did not go through.
#[derive(Debug, Clone)]
pub enum Rejection {
    /// Authorization, execution, proving or fee phase failed.
    Ledger(LedgerError),
    /// Network answered with something other than `200` and an id.
    Broadcast { status: u16, body: String },
    /// POST failed in transport. The network may or may not have the transaction.
    Transport(String),
    /// Arguments could not be encoded for the program.
    InvalidInput(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ledger(e) => write!(f, "{e}"),
            Self::Broadcast { status, body } if body.trim().is_empty() => {
                write!(f, "broadcast rejected with status {status}")
            }
            Self::Broadcast { status, body } => {
                write!(f, "broadcast rejected with status {status}: {}", body.trim())
            }
            Self::Transport(reason) => write!(f, "broadcast outcome unknown: {reason}"),
            Self::InvalidInput(reason) => write!(f, "invalid input: {reason}"),
        }
    }
}

/// Tri-state result of a submission. Only `Accepted` may lead to a
/// market being marked resolved.
#[derive(Debug, Clone)]
pub enum SubmissionResult {
    Accepted(TransactionId),
    Rejected(Rejection),
    /// Credential or endpoint missing.
    ConfigError(String),
}

impl SubmissionResult {
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// What the journal says about a market's previous resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// No attempt needs attention; submit normally.
    Clear,
    /// A previous attempt reached the network.
    Confirmed(TransactionId),
    /// A previous broadcast is in doubt and the network could not be asked.
    InDoubt(String),
}

/// Converts program calls into accepted network transactions.
pub struct ResolutionSubmitter {
    ledger: Arc<dyn LedgerClient>,
    broadcaster: Arc<dyn TransactionBroadcaster>,
    journal: Arc<dyn SubmissionJournal>,
    settings: SubmitterSettings,
}

impl ResolutionSubmitter {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        broadcaster: Arc<dyn TransactionBroadcaster>,
        journal: Arc<dyn SubmissionJournal>,
        settings: SubmitterSettings,
    ) -> Self {
        Self {
            ledger,
            broadcaster,
            journal,
            settings,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &SubmitterSettings {
        &self.settings
    }

    /// Submit `resolve_pool(market_id, option)`.
    ///
    /// # Errors
    ///
    /// Only journal (storage) failures are errors. Everything else is a
    /// [`SubmissionResult`].
    pub async fn resolve(
        &self,
        market_id: &MarketId,
        option: WinningOption,
    ) -> Result<SubmissionResult> {
        let pool = match FieldLiteral::from_text(market_id.as_str()) {
            Ok(pool) => pool,
            Err(e) => {
                return Ok(SubmissionResult::Rejected(Rejection::InvalidInput(
                    e.to_string(),
                )))
            }
        };
        let call = ProgramCall::resolve_pool(&self.settings.program_id, &pool, option);
        self.submit(market_id, call, self.settings.resolve_fee, Some(option))
            .await
    }

    /// Submit `create_pool(title, .., deadline)`. The journal key is the
    /// title field, which is also the market id the pool is registered under.
    ///
    /// # Errors
    ///
    /// Only journal (storage) failures are errors.
    pub async fn create_pool(
        &self,
        title: &FieldLiteral,
        deadline: u64,
    ) -> Result<SubmissionResult> {
        let market_id = MarketId::from(title.as_str());
        let call = ProgramCall::create_pool(&self.settings.program_id, title, deadline);
        self.submit(&market_id, call, self.settings.create_fee, None)
            .await
    }

    /// Inspect the latest resolution attempt for `market_id`.
    ///
    /// An attempt left in `broadcasting` is looked up on the network. If
    /// the network knows it, the journal is advanced to `accepted`; if it
    /// does not, the attempt is closed as rejected so the market is
    /// submitted again.
    ///
    /// # Errors
    ///
    /// Journal failures.
    pub async fn reconcile(&self, market_id: &MarketId) -> Result<Reconciliation> {
        let Some(latest) = self.journal.latest(market_id, RESOLVE_POOL).await? else {
            return Ok(Reconciliation::Clear);
        };

        match (latest.phase, latest.transaction_id.clone()) {
            (SubmissionPhase::Accepted, Some(id)) => Ok(Reconciliation::Confirmed(id)),
            (SubmissionPhase::Broadcasting, Some(id)) => {
                match self.broadcaster.is_known(&id).await {
                    Ok(true) => {
                        info!(market_id = %market_id, transaction_id = %id, "In-doubt broadcast found on network");
                        self.journal
                            .record(&latest.advance(SubmissionPhase::Accepted, now()))
                            .await?;
                        Ok(Reconciliation::Confirmed(id))
                    }
                    Ok(false) => {
                        debug!(market_id = %market_id, transaction_id = %id, "In-doubt broadcast unknown to network");
                        let closed = latest
                            .advance(SubmissionPhase::Rejected, now())
                            .with_detail("not found on network");
                        self.journal.record(&closed).await?;
                        Ok(Reconciliation::Clear)
                    }
                    Err(e) => Ok(Reconciliation::InDoubt(e.to_string())),
                }
            }
            _ => Ok(Reconciliation::Clear),
        }
    }

    async fn submit(
        &self,
        market_id: &MarketId,
        call: ProgramCall,
        fee: u64,
        option: Option<WinningOption>,
    ) -> Result<SubmissionResult> {
        let Some(credential) = self.settings.credential.as_ref() else {
            return Ok(SubmissionResult::ConfigError(
                "ORACLE_PRIVATE_KEY is not set".into(),
            ));
        };
        let Some(query) = self.settings.query_endpoint.as_deref() else {
            return Ok(SubmissionResult::ConfigError(
                "ledger node URL is not set".into(),
            ));
        };

        info!(
            market_id = %market_id,
            function = %call.function,
            inputs = ?call.inputs,
            fee,
            "Authorizing program call"
        );

        let timeout = self.settings.execution_timeout;
        let proved =
            tokio::time::timeout(timeout, self.prove(credential, query, &call, fee)).await;
        let (execution, fee) = match proved {
            Ok(Ok(proved)) => proved,
            Ok(Err(LedgerError::Credential(reason))) => {
                return Ok(SubmissionResult::ConfigError(reason));
            }
            Ok(Err(e)) => {
                warn!(market_id = %market_id, error = %e, "Ledger phase failed");
                return Ok(SubmissionResult::Rejected(Rejection::Ledger(e)));
            }
            Err(_) => {
                let e = LedgerError::Timeout {
                    secs: timeout.as_secs(),
                };
                warn!(market_id = %market_id, error = %e, "Execution cancelled");
                return Ok(SubmissionResult::Rejected(Rejection::Ledger(e)));
            }
        };

        let attempt = SubmissionAttempt {
            market_id: market_id.clone(),
            function: call.function.clone(),
            winning_option: option,
            execution_id: execution.id.clone(),
            transaction_id: None,
            phase: SubmissionPhase::Proved,
            detail: None,
            recorded_at: now(),
        };
        self.journal.record(&attempt).await?;

        let transaction = match self.ledger.build_transaction(execution, fee).await {
            Ok(transaction) => transaction,
            Err(e) => {
                warn!(market_id = %market_id, error = %e, "Transaction assembly failed");
                let closed = attempt
                    .advance(SubmissionPhase::Rejected, now())
                    .with_detail(e.to_string());
                self.journal.record(&closed).await?;
                return Ok(SubmissionResult::Rejected(Rejection::Ledger(e)));
            }
        };

        let attempt = attempt
            .advance(SubmissionPhase::Broadcasting, now())
            .with_transaction(transaction.id.clone());
        self.journal.record(&attempt).await?;

        let response = match self.broadcaster.broadcast(&transaction).await {
            Ok(response) => response,
            Err(e) => {
                // Journal stays at `broadcasting`; the next cycle looks it up.
                warn!(
                    market_id = %market_id,
                    transaction_id = %transaction.id,
                    error = %e,
                    "Broadcast outcome unknown"
                );
                return Ok(SubmissionResult::Rejected(Rejection::Transport(
                    e.to_string(),
                )));
            }
        };

        if response.status == 200 {
            if let Some(id) = TransactionId::from_response_body(&response.body) {
                let accepted = attempt
                    .advance(SubmissionPhase::Accepted, now())
                    .with_transaction(id.clone());
                self.journal.record(&accepted).await?;
                info!(market_id = %market_id, transaction_id = %id, "Transaction accepted");
                return Ok(SubmissionResult::Accepted(id));
            }
        }

        warn!(
            market_id = %market_id,
            status = response.status,
            body = %response.body.trim(),
            "Broadcast rejected"
        );
        let closed = attempt
            .advance(SubmissionPhase::Rejected, now())
            .with_detail(format!("status {}", response.status));
        self.journal.record(&closed).await?;
        Ok(SubmissionResult::Rejected(Rejection::Broadcast {
            status: response.status,
            body: response.body,
        }))
    }

    /// Authorize, execute and prove the call and its fee.
    async fn prove(
        &self,
        credential: &Credential,
        query: &str,
        call: &ProgramCall,
        fee: u64,
    ) -> std::result::Result<(Execution, Fee), LedgerError> {
        let authorization = self.ledger.authorize(credential, call).await?;
        let executed = self.ledger.execute(authorization).await?;
        debug!(outputs = ?executed.outputs, "Call executed");
        let trace = self.ledger.prepare(executed.trace, query).await?;
        let execution = self.ledger.prove_execution(trace, &call.locator()).await?;
        debug!(execution_id = %execution.id, "Execution proved");

        let fee_authorization = self
            .ledger
            .authorize_fee_public(credential, fee, &execution.id)
            .await?;
        let fee_trace = self.ledger.execute_fee(fee_authorization).await?;
        let fee_trace = self.ledger.prepare(fee_trace, query).await?;
        let fee = self.ledger.prove_fee(fee_trace).await?;
        Ok((execution, fee))
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
