//! Ledger client and broadcast ports.
//!
//! The ledger client owns keys and proof generation. The oracle only moves
//! opaque artifacts between its phases:
//!
//! ```text
//! authorize ─► execute ─► prepare ─► prove_execution ─► Execution (id)
//!                                                          │
//! authorize_fee_public(id) ─► execute_fee ─► prepare ─► prove_fee ─► Fee
//!                                                          │
//!                        build_transaction(Execution, Fee) ─► Transaction ─► broadcast
//! ```

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ExecutionId, FieldLiteral, Locator, PoolStats, ProgramCall, TransactionId};
use crate::error::{BroadcastError, LedgerError};

/// Secret used to sign authorizations. Never printed.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Expose the secret for the wire. Keep the borrow short.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Signed request to run a program function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Authorization(pub Value);

/// Signed request to pay a public fee for an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeAuthorization(pub Value);

/// Execution trace awaiting preparation and proof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace(pub Value);

/// Output of running an authorization.
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    /// Function outputs as reported by the ledger client.
    pub outputs: Vec<String>,
    pub trace: Trace,
}

/// Proved execution with its unique identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub id: ExecutionId,
    pub body: Value,
}

/// Proved fee payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fee(pub Value);

/// Serialized transaction ready for broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub body: String,
}

/// External capability that authorizes, executes and proves program calls.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Sign a call. Fails with [`LedgerError::Credential`] when the
    /// credential is absent or refused.
    async fn authorize(
        &self,
        credential: &Credential,
        call: &ProgramCall,
    ) -> Result<Authorization, LedgerError>;

    /// Run an authorized call against program state.
    async fn execute(&self, authorization: Authorization) -> Result<Executed, LedgerError>;

    /// Bind a trace to live chain state served by `query_endpoint`.
    async fn prepare(&self, trace: Trace, query_endpoint: &str) -> Result<Trace, LedgerError>;

    /// Prove a prepared execution trace.
    async fn prove_execution(
        &self,
        trace: Trace,
        locator: &Locator,
    ) -> Result<Execution, LedgerError>;

    /// Sign a public fee of `amount` microcredits tied to an execution.
    async fn authorize_fee_public(
        &self,
        credential: &Credential,
        amount: u64,
        execution_id: &ExecutionId,
    ) -> Result<FeeAuthorization, LedgerError>;

    /// Run a fee authorization.
    async fn execute_fee(&self, authorization: FeeAuthorization) -> Result<Trace, LedgerError>;

    /// Prove a prepared fee trace.
    async fn prove_fee(&self, trace: Trace) -> Result<Fee, LedgerError>;

    /// Assemble and serialize the transaction.
    async fn build_transaction(
        &self,
        execution: Execution,
        fee: Fee,
    ) -> Result<Transaction, LedgerError>;
}

/// Raw answer of the broadcast endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastResponse {
    pub status: u16,
    pub body: String,
}

/// Network endpoint that accepts serialized transactions.
#[async_trait]
pub trait TransactionBroadcaster: Send + Sync {
    /// POST the transaction. Transport failures are errors; any HTTP
    /// status, including non-200, is a response.
    async fn broadcast(&self, transaction: &Transaction)
        -> Result<BroadcastResponse, BroadcastError>;

    /// Whether the network knows a transaction id.
    async fn is_known(&self, id: &TransactionId) -> Result<bool, BroadcastError>;
}

/// Read access to the program's `pools` mapping.
#[async_trait]
pub trait PoolStatsSource: Send + Sync {
    /// Stake totals for `pool`, or `None` when the mapping has no entry.
    async fn pool_stats(
        &self,
        program_id: &str,
        pool: &FieldLiteral,
    ) -> Result<Option<PoolStats>, BroadcastError>;
}
