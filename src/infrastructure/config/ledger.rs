//! Ledger settings: program, network, fees and the proving sidecar.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::submitter::SubmitterSettings;
use crate::port::outbound::ledger::Credential;

/// Ledger configuration.
///
/// The signing credential is loaded from `ORACLE_PRIVATE_KEY` at runtime,
/// never from the config file. `ALEO_NODE_URL` overrides `node_url`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Deployed prediction program.
    pub program_id: String,
    /// Network path segment used by the node API.
    pub network: String,
    /// Node base URL, used to prepare traces and to broadcast.
    pub node_url: Option<String>,
    /// Proving sidecar base URL.
    pub prover_url: String,
    /// `resolve_pool` fee in microcredits.
    pub resolve_fee: u64,
    /// `create_pool` fee in microcredits.
    pub create_fee: u64,
    /// Upper bound on authorize/execute/prove, in seconds.
    pub execution_timeout_secs: u64,
    /// Timeout for broadcast and lookup requests, in seconds.
    pub broadcast_timeout_secs: u64,
    #[serde(skip)]
    pub credential: Option<Credential>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            program_id: "prediction.aleo".into(),
            network: "testnet".into(),
            node_url: None,
            prover_url: "http://127.0.0.1:3030".into(),
            resolve_fee: 100_000,
            create_fee: 500_000,
            execution_timeout_secs: 300,
            broadcast_timeout_secs: 30,
            credential: None,
        }
    }
}

impl LedgerConfig {
    /// Full broadcast URL, when a node is configured.
    #[must_use]
    pub fn broadcast_url(&self) -> Option<String> {
        self.node_url.as_ref().map(|node| {
            format!(
                "{}/{}/transaction/broadcast",
                node.trim_end_matches('/'),
                self.network
            )
        })
    }

    #[must_use]
    pub fn broadcast_timeout(&self) -> Duration {
        Duration::from_secs(self.broadcast_timeout_secs)
    }

    /// Settings handed to the resolution submitter.
    #[must_use]
    pub fn submitter_settings(&self) -> SubmitterSettings {
        SubmitterSettings {
            program_id: self.program_id.clone(),
            query_endpoint: self.node_url.clone(),
            credential: self.credential.clone(),
            resolve_fee: self.resolve_fee,
            create_fee: self.create_fee,
            execution_timeout: Duration::from_secs(self.execution_timeout_secs),
        }
    }
}
