//! HTTP client for a ledger node: broadcast, transaction lookup and
//! mapping reads.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use tracing::{debug, warn};

use crate::domain::{FieldLiteral, PoolStats, TransactionId};
use crate::error::BroadcastError;
use crate::port::outbound::ledger::{
    BroadcastResponse, PoolStatsSource, Transaction, TransactionBroadcaster,
};

/// Mapping that holds one entry per pool.
const POOLS_MAPPING: &str = "pools";

/// POSTs serialized transactions to `{node}/{network}/transaction/broadcast`,
/// looks ids up at `{node}/{network}/transaction/{id}` and reads pool entries
/// from `{node}/{network}/program/{program}/mapping/pools/{key}`.
pub struct HttpBroadcaster {
    http: HttpClient,
    node_url: Option<String>,
    network: String,
}

impl HttpBroadcaster {
    #[must_use]
    pub fn new(node_url: Option<String>, network: impl Into<String>, timeout: Duration) -> Self {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });
        Self {
            http,
            node_url: node_url.map(|url| url.trim_end_matches('/').to_string()),
            network: network.into(),
        }
    }

    fn node(&self) -> Result<&str, BroadcastError> {
        self.node_url
            .as_deref()
            .ok_or_else(|| BroadcastError::Transport("ledger node URL is not set".into()))
    }

    /// Broadcast endpoint, when a node is configured.
    #[must_use]
    pub fn broadcast_url(&self) -> Option<String> {
        self.node_url
            .as_ref()
            .map(|node| format!("{node}/{}/transaction/broadcast", self.network))
    }
}

#[async_trait]
impl TransactionBroadcaster for HttpBroadcaster {
    async fn broadcast(
        &self,
        transaction: &Transaction,
    ) -> Result<BroadcastResponse, BroadcastError> {
        let url = format!("{}/{}/transaction/broadcast", self.node()?, self.network);
        debug!(transaction_id = %transaction.id, url = %url, "Broadcasting transaction");

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(transaction.body.clone())
            .send()
            .await
            .map_err(|e| BroadcastError::Transport(e.without_url().to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| BroadcastError::Transport(e.without_url().to_string()))?;

        Ok(BroadcastResponse { status, body })
    }

    async fn is_known(&self, id: &TransactionId) -> Result<bool, BroadcastError> {
        let url = format!("{}/{}/transaction/{id}", self.node()?, self.network);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| BroadcastError::Transport(e.without_url().to_string()))?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            other => Err(BroadcastError::UnexpectedStatus {
                status: other.as_u16(),
                url,
            }),
        }
    }
}

#[async_trait]
impl PoolStatsSource for HttpBroadcaster {
    async fn pool_stats(
        &self,
        program_id: &str,
        pool: &FieldLiteral,
    ) -> Result<Option<PoolStats>, BroadcastError> {
        let url = format!(
            "{}/{}/program/{program_id}/mapping/{POOLS_MAPPING}/{pool}",
            self.node()?,
            self.network
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| BroadcastError::Transport(e.without_url().to_string()))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Ok(None),
            other => {
                return Err(BroadcastError::UnexpectedStatus {
                    status: other.as_u16(),
                    url,
                })
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| BroadcastError::Transport(e.without_url().to_string()))?;
        let Some(value) = mapping_value(&body) else {
            return Ok(None);
        };
        PoolStats::from_mapping_value(&value)
            .map(Some)
            .ok_or_else(|| BroadcastError::Malformed {
                url,
                reason: "pool entry lacks stake totals".into(),
            })
    }
}

/// Mapping lookups answer with a JSON string holding the value, or `null`
/// for a missing key. Some nodes send the bare literal instead.
fn mapping_value(body: &str) -> Option<String> {
    match serde_json::from_str::<Option<String>>(body) {
        Ok(value) => value,
        Err(_) => {
            let raw = body.trim();
            (!raw.is_empty()).then(|| raw.to_string())
        }
    }
}
