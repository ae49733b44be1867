//! Fake ledger client, broadcaster and pool mapping.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use crate::domain::{ExecutionId, FieldLiteral, Locator, PoolStats, ProgramCall, TransactionId};
use crate::error::{BroadcastError, LedgerError};
use crate::port::outbound::ledger::{
    Authorization, BroadcastResponse, Credential, Executed, Execution, Fee, FeeAuthorization,
    LedgerClient, PoolStatsSource, Trace, Transaction, TransactionBroadcaster,
};

/// Ledger client phase, for injecting failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerPhase {
    Authorize,
    Execute,
    Prepare,
    ProveExecution,
    AuthorizeFee,
    ExecuteFee,
    ProveFee,
    BuildTransaction,
}

/// Ledger client that succeeds (unless told otherwise) and records what it
/// was asked to do.
///
/// Execution ids are `au1exec<n>`; the matching transaction id is `at1exec<n>`.
#[derive(Default)]
pub struct RecordingLedger {
    calls: Mutex<Vec<ProgramCall>>,
    fees: Mutex<Vec<u64>>,
    failure: Option<(LedgerPhase, LedgerError)>,
    delay: Option<Duration>,
    executions: AtomicU32,
}

impl RecordingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call at `phase` with `error`.
    #[must_use]
    pub fn failing_at(mut self, phase: LedgerPhase, error: LedgerError) -> Self {
        self.failure = Some((phase, error));
        self
    }

    /// Sleep for `delay` inside `execute`, simulating a slow prover.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Calls that reached `authorize`.
    pub fn calls(&self) -> Vec<ProgramCall> {
        self.calls.lock().clone()
    }

    /// Fee amounts that reached `authorize_fee_public`.
    pub fn fees(&self) -> Vec<u64> {
        self.fees.lock().clone()
    }

    fn check(&self, phase: LedgerPhase) -> Result<(), LedgerError> {
        match &self.failure {
            Some((failing, error)) if *failing == phase => Err(error.clone()),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl LedgerClient for RecordingLedger {
    async fn authorize(
        &self,
        _credential: &Credential,
        call: &ProgramCall,
    ) -> Result<Authorization, LedgerError> {
        self.calls.lock().push(call.clone());
        self.check(LedgerPhase::Authorize)?;
        Ok(Authorization(json!({
            "program": call.program_id,
            "function": call.function,
            "inputs": call.inputs,
        })))
    }

    async fn execute(&self, authorization: Authorization) -> Result<Executed, LedgerError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.check(LedgerPhase::Execute)?;
        Ok(Executed {
            outputs: Vec::new(),
            trace: Trace(authorization.0),
        })
    }

    async fn prepare(&self, trace: Trace, _query_endpoint: &str) -> Result<Trace, LedgerError> {
        self.check(LedgerPhase::Prepare)?;
        Ok(trace)
    }

    async fn prove_execution(
        &self,
        trace: Trace,
        _locator: &Locator,
    ) -> Result<Execution, LedgerError> {
        self.check(LedgerPhase::ProveExecution)?;
        let n = self.executions.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Execution {
            id: ExecutionId::new(format!("au1exec{n}")),
            body: trace.0,
        })
    }

    async fn authorize_fee_public(
        &self,
        _credential: &Credential,
        amount: u64,
        execution_id: &ExecutionId,
    ) -> Result<FeeAuthorization, LedgerError> {
        self.fees.lock().push(amount);
        self.check(LedgerPhase::AuthorizeFee)?;
        Ok(FeeAuthorization(json!({
            "amount": amount,
            "execution_id": execution_id.as_str(),
        })))
    }

    async fn execute_fee(&self, authorization: FeeAuthorization) -> Result<Trace, LedgerError> {
        self.check(LedgerPhase::ExecuteFee)?;
        Ok(Trace(authorization.0))
    }

    async fn prove_fee(&self, trace: Trace) -> Result<Fee, LedgerError> {
        self.check(LedgerPhase::ProveFee)?;
        Ok(Fee(trace.0))
    }

    async fn build_transaction(
        &self,
        execution: Execution,
        fee: Fee,
    ) -> Result<Transaction, LedgerError> {
        self.check(LedgerPhase::BuildTransaction)?;
        let suffix = execution.id.as_str().trim_start_matches("au1");
        let id = TransactionId::new(format!("at1{suffix}"));
        let body = json!({ "id": id.as_str(), "execution": execution.body, "fee": fee.0 });
        Ok(Transaction {
            id,
            body: body.to_string(),
        })
    }
}

/// How the fake network answers a broadcast.
#[derive(Debug, Clone)]
pub enum BroadcastOutcome {
    /// `200` with the transaction id as a JSON string.
    Accept,
    Reject { status: u16, body: String },
    /// Transport failure.
    Unreachable,
}

/// Broadcaster with a configurable answer and an in-memory set of known ids.
pub struct ScriptedBroadcaster {
    outcome: Mutex<BroadcastOutcome>,
    known: Mutex<HashSet<TransactionId>>,
    lookup_error: Mutex<Option<BroadcastError>>,
    broadcasts: Mutex<Vec<TransactionId>>,
}

impl ScriptedBroadcaster {
    pub fn new(outcome: BroadcastOutcome) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            known: Mutex::new(HashSet::new()),
            lookup_error: Mutex::new(None),
            broadcasts: Mutex::new(Vec::new()),
        }
    }

    pub fn accepting() -> Self {
        Self::new(BroadcastOutcome::Accept)
    }

    pub fn rejecting(status: u16, body: &str) -> Self {
        Self::new(BroadcastOutcome::Reject {
            status,
            body: body.to_string(),
        })
    }

    pub fn unreachable() -> Self {
        Self::new(BroadcastOutcome::Unreachable)
    }

    /// Change the answer for later broadcasts.
    pub fn set(&self, outcome: BroadcastOutcome) {
        *self.outcome.lock() = outcome;
    }

    /// Make the network report `id` as known.
    pub fn mark_known(&self, id: TransactionId) {
        self.known.lock().insert(id);
    }

    /// Make every lookup fail with `error`.
    pub fn fail_lookups(&self, error: BroadcastError) {
        *self.lookup_error.lock() = Some(error);
    }

    /// Ids of every transaction that was POSTed, in order.
    pub fn broadcasts(&self) -> Vec<TransactionId> {
        self.broadcasts.lock().clone()
    }
}

#[async_trait]
impl TransactionBroadcaster for ScriptedBroadcaster {
    async fn broadcast(
        &self,
        transaction: &Transaction,
    ) -> Result<BroadcastResponse, BroadcastError> {
        self.broadcasts.lock().push(transaction.id.clone());
        let outcome = self.outcome.lock().clone();
        match outcome {
            BroadcastOutcome::Accept => {
                self.mark_known(transaction.id.clone());
                Ok(BroadcastResponse {
                    status: 200,
                    body: format!("\"{}\"", transaction.id),
                })
            }
            BroadcastOutcome::Reject { status, body } => Ok(BroadcastResponse { status, body }),
            BroadcastOutcome::Unreachable => {
                Err(BroadcastError::Transport("connection reset by peer".into()))
            }
        }
    }

    async fn is_known(&self, id: &TransactionId) -> Result<bool, BroadcastError> {
        if let Some(error) = self.lookup_error.lock().clone() {
            return Err(error);
        }
        Ok(self.known.lock().contains(id))
    }
}

/// In-memory `pools` mapping keyed by field literal.
#[derive(Default)]
pub struct ScriptedPools {
    entries: Mutex<HashMap<String, PoolStats>>,
    error: Mutex<Option<BroadcastError>>,
    program_ids: Mutex<Vec<String>>,
}

impl ScriptedPools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, pool: &str, stats: PoolStats) {
        self.entries.lock().insert(pool.to_string(), stats);
    }

    /// Make every read fail with `error`.
    pub fn fail(&self, error: BroadcastError) {
        *self.error.lock() = Some(error);
    }

    /// Program id passed to each read, in order.
    pub fn program_ids(&self) -> Vec<String> {
        self.program_ids.lock().clone()
    }
}

#[async_trait]
impl PoolStatsSource for ScriptedPools {
    async fn pool_stats(
        &self,
        program_id: &str,
        pool: &FieldLiteral,
    ) -> Result<Option<PoolStats>, BroadcastError> {
        self.program_ids.lock().push(program_id.to_string());
        if let Some(error) = self.error.lock().clone() {
            return Err(error);
        }
        Ok(self.entries.lock().get(pool.as_str()).copied())
    }
}
