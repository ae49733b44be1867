//! Ledger client backed by a local proving sidecar.
//!
//! The sidecar holds the proving SDK and performs key handling. Every
//! phase is one JSON POST; artifacts travel as opaque JSON values.
//!
//! | phase                  | endpoint            |
//! |------------------------|---------------------|
//! | authorize              | `/authorize`        |
//! | execute / execute_fee  | `/execute`          |
//! | prepare                | `/prepare`          |
//! | prove_execution        | `/prove/execution`  |
//! | authorize_fee_public   | `/authorize/fee`    |
//! | prove_fee              | `/prove/fee`        |
//! | build_transaction      | `/transaction`      |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{ExecutionId, Locator, ProgramCall, TransactionId};
use crate::error::LedgerError;
use crate::port::outbound::ledger::{
    Authorization, Credential, Executed, Execution, Fee, FeeAuthorization, LedgerClient, Trace,
    Transaction,
};

#[derive(Serialize)]
struct AuthorizeRequest<'a> {
    private_key: &'a str,
    program_id: &'a str,
    function: &'a str,
    inputs: &'a [String],
}

#[derive(Serialize)]
struct FeeAuthorizeRequest<'a> {
    private_key: &'a str,
    amount: u64,
    execution_id: &'a str,
}

#[derive(Deserialize)]
struct AuthorizationResponse {
    authorization: Value,
}

#[derive(Serialize)]
struct ExecuteRequest {
    authorization: Value,
}

#[derive(Deserialize)]
struct ExecuteResponse {
    #[serde(default)]
    outputs: Vec<String>,
    trace: Value,
}

#[derive(Serialize)]
struct PrepareRequest<'a> {
    trace: Value,
    query: &'a str,
}

#[derive(Deserialize)]
struct TraceResponse {
    trace: Value,
}

#[derive(Serialize)]
struct ProveExecutionRequest {
    trace: Value,
    locator: String,
}

#[derive(Deserialize)]
struct ProveExecutionResponse {
    execution_id: String,
    execution: Value,
}

#[derive(Serialize)]
struct ProveFeeRequest {
    trace: Value,
}

#[derive(Deserialize)]
struct ProveFeeResponse {
    fee: Value,
}

#[derive(Serialize)]
struct TransactionRequest {
    execution: Value,
    fee: Value,
}

#[derive(Deserialize)]
struct TransactionResponse {
    id: String,
    transaction: Value,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// HTTP client for the proving sidecar.
pub struct SidecarLedgerClient {
    http: HttpClient,
    base_url: String,
}

impl SidecarLedgerClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = HttpClient::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// POST `body` to `path`, mapping failures with `phase`.
    async fn post<Req, Resp>(
        &self,
        path: &str,
        body: &Req,
        phase: fn(String) -> LedgerError,
    ) -> Result<Resp, LedgerError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        debug!(path, "Calling ledger sidecar");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LedgerError::Transport(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(classify(status, &text, phase));
        }

        serde_json::from_str(&text)
            .map_err(|e| phase(format!("unexpected sidecar response from {path}: {e}")))
    }
}

/// Map a failed sidecar answer to a ledger error.
fn classify(status: StatusCode, body: &str, phase: fn(String) -> LedgerError) -> LedgerError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| format!("status {}: {}", status.as_u16(), body.trim()));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LedgerError::Credential(message),
        _ => phase(message),
    }
}

#[async_trait]
impl LedgerClient for SidecarLedgerClient {
    async fn authorize(
        &self,
        credential: &Credential,
        call: &ProgramCall,
    ) -> Result<Authorization, LedgerError> {
        let request = AuthorizeRequest {
            private_key: credential.expose(),
            program_id: &call.program_id,
            function: &call.function,
            inputs: &call.inputs,
        };
        let response: AuthorizationResponse = self
            .post("/authorize", &request, LedgerError::Authorization)
            .await?;
        Ok(Authorization(response.authorization))
    }

    async fn execute(&self, authorization: Authorization) -> Result<Executed, LedgerError> {
        let request = ExecuteRequest {
            authorization: authorization.0,
        };
        let response: ExecuteResponse = self
            .post("/execute", &request, LedgerError::Execution)
            .await?;
        Ok(Executed {
            outputs: response.outputs,
            trace: Trace(response.trace),
        })
    }

    async fn prepare(&self, trace: Trace, query_endpoint: &str) -> Result<Trace, LedgerError> {
        let request = PrepareRequest {
            trace: trace.0,
            query: query_endpoint,
        };
        let response: TraceResponse = self
            .post("/prepare", &request, LedgerError::Execution)
            .await?;
        Ok(Trace(response.trace))
    }

    async fn prove_execution(
        &self,
        trace: Trace,
        locator: &Locator,
    ) -> Result<Execution, LedgerError> {
        let request = ProveExecutionRequest {
            trace: trace.0,
            locator: format!("{}/{}", locator.program_id, locator.function),
        };
        let response: ProveExecutionResponse = self
            .post("/prove/execution", &request, LedgerError::Proof)
            .await?;
        Ok(Execution {
            id: ExecutionId::new(response.execution_id),
            body: response.execution,
        })
    }

    async fn authorize_fee_public(
        &self,
        credential: &Credential,
        amount: u64,
        execution_id: &ExecutionId,
    ) -> Result<FeeAuthorization, LedgerError> {
        let request = FeeAuthorizeRequest {
            private_key: credential.expose(),
            amount,
            execution_id: execution_id.as_str(),
        };
        let response: AuthorizationResponse = self
            .post("/authorize/fee", &request, LedgerError::Fee)
            .await?;
        Ok(FeeAuthorization(response.authorization))
    }

    async fn execute_fee(&self, authorization: FeeAuthorization) -> Result<Trace, LedgerError> {
        let request = ExecuteRequest {
            authorization: authorization.0,
        };
        let response: ExecuteResponse = self.post("/execute", &request, LedgerError::Fee).await?;
        Ok(Trace(response.trace))
    }

    async fn prove_fee(&self, trace: Trace) -> Result<Fee, LedgerError> {
        let request = ProveFeeRequest { trace: trace.0 };
        let response: ProveFeeResponse = self
            .post("/prove/fee", &request, LedgerError::Fee)
            .await?;
        Ok(Fee(response.fee))
    }

    async fn build_transaction(
        &self,
        execution: Execution,
        fee: Fee,
    ) -> Result<Transaction, LedgerError> {
        let request = TransactionRequest {
            execution: execution.body,
            fee: fee.0,
        };
        let response: TransactionResponse = self
            .post("/transaction", &request, LedgerError::Transaction)
            .await?;
        let body = match response.transaction {
            Value::String(serialized) => serialized,
            other => other.to_string(),
        };
        Ok(Transaction {
            id: TransactionId::new(response.id),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldLiteral, WinningOption};
    use crate::testkit::http::CannedServer;

    fn resolve_call() -> ProgramCall {
        let pool = FieldLiteral::from_text("9field").unwrap();
        ProgramCall::resolve_pool("prediction.aleo", &pool, WinningOption::Yes)
    }

    #[tokio::test]
    async fn authorize_sends_call_and_key() {
        let server = CannedServer::start(vec![(200, r#"{"authorization":{"requests":[]}}"#)]).await;
        let client = SidecarLedgerClient::new(&server.base_url);

        let auth = client
            .authorize(&Credential::new("APrivateKey1zkp"), &resolve_call())
            .await
            .unwrap();

        assert_eq!(auth.0, serde_json::json!({ "requests": [] }));
        let requests = server.requests();
        assert_eq!(requests[0].line, "POST /authorize");
        let sent: Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(sent["private_key"], "APrivateKey1zkp");
        assert_eq!(sent["function"], "resolve_pool");
        assert_eq!(sent["inputs"], serde_json::json!(["9field", "1u64"]));
    }

    #[tokio::test]
    async fn unauthorized_is_credential_error() {
        let server = CannedServer::start(vec![(401, r#"{"error":"invalid private key"}"#)]).await;
        let client = SidecarLedgerClient::new(&server.base_url);

        let err = client
            .authorize(&Credential::new("bad"), &resolve_call())
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Credential(ref m) if m == "invalid private key"));
    }

    #[tokio::test]
    async fn failed_proof_maps_to_proof_error() {
        let server = CannedServer::start(vec![(500, "prover crashed")]).await;
        let client = SidecarLedgerClient::new(&server.base_url);
        let locator = resolve_call().locator();

        let err = client
            .prove_execution(Trace(Value::Null), &locator)
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Proof(ref m) if m.contains("prover crashed")));
    }

    #[tokio::test]
    async fn prove_execution_returns_id_and_sends_locator() {
        let server = CannedServer::start(vec![(
            200,
            r#"{"execution_id":"au1xyz","execution":{"transitions":[]}}"#,
        )])
        .await;
        let client = SidecarLedgerClient::new(&server.base_url);

        let execution = client
            .prove_execution(Trace(Value::Null), &resolve_call().locator())
            .await
            .unwrap();

        assert_eq!(execution.id.as_str(), "au1xyz");
        let sent: Value = serde_json::from_str(&server.requests()[0].body).unwrap();
        assert_eq!(sent["locator"], "prediction.aleo/resolve_pool");
    }

    #[tokio::test]
    async fn transaction_string_is_passed_through() {
        let server = CannedServer::start(vec![(
            200,
            r#"{"id":"at1abc","transaction":"{\"type\":\"execute\"}"}"#,
        )])
        .await;
        let client = SidecarLedgerClient::new(&server.base_url);
        let execution = Execution {
            id: ExecutionId::new("au1xyz"),
            body: Value::Null,
        };

        let tx = client
            .build_transaction(execution, Fee(Value::Null))
            .await
            .unwrap();

        assert_eq!(tx.id.as_str(), "at1abc");
        assert_eq!(tx.body, r#"{"type":"execute"}"#);
    }

    #[tokio::test]
    async fn unreachable_sidecar_is_transport_error() {
        let client = SidecarLedgerClient::new("http://127.0.0.1:9");
        let err = client.prove_fee(Trace(Value::Null)).await.unwrap_err();
        assert!(matches!(err, LedgerError::Transport(_)));
    }

    #[test]
    fn classify_falls_back_to_status_text() {
        let err = classify(StatusCode::BAD_GATEWAY, "upstream down", LedgerError::Fee);
        assert_eq!(err.to_string(), "fee authorization failed: status 502: upstream down");
    }
}
